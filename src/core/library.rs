//! Library facade.
//!
//! Wires the store, scanner, list store, reconciler and enrichment jobs
//! together and exposes the operations a front end (CLI or HTTP) needs.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ResolvedConfig;
use crate::domain::{Bookmark, ContentEntry, FileRef, PlayerConfig};
use crate::enrich::{
    ChapterProbe, Enricher, EnrichmentJobs, FfprobeProbe, JobError, JobState, JobTicket,
};
use crate::library::{FeedImport, ListError, ListStore, ScanError, ScanReport, Scanner};
use crate::playback::{BookmarkStore, EntryView, LibraryError, Reconciler, SaveOutcome};
use crate::store::{Database, StoreError, Table};

/// Which partition of the library an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Scanned albums and audiobooks
    Directories,

    /// Curated playlists
    Playlists,

    /// Imported podcast/book feeds
    Books,
}

/// Entry point for all library operations
pub struct Library {
    config: ResolvedConfig,
    directories: Table<ContentEntry>,
    lists: ListStore,
    bookmarks: BookmarkStore,
    player_configs: Table<PlayerConfig>,
    reconciler: Reconciler,
    scanner: Scanner,
    jobs: EnrichmentJobs,
}

impl Library {
    /// Open the configured database with the ffprobe chapter probe.
    ///
    /// Must be called inside a Tokio runtime (the enrichment worker is spawned).
    pub fn open(config: ResolvedConfig) -> Result<Self> {
        let db = Database::open(&config.database)
            .with_context(|| format!("Failed to open database: {}", config.database.display()))?;
        let probe = Arc::new(FfprobeProbe::from_settings(&config.enrichment));

        Ok(Self::with_database(config, db, probe)?)
    }

    /// Build a library over an already opened database
    pub fn with_database(
        config: ResolvedConfig,
        db: Arc<Database>,
        probe: Arc<dyn ChapterProbe>,
    ) -> Result<Self, StoreError> {
        let directories = db.table(&config.tables.directories)?;
        let lists = ListStore::new(db.table(&config.tables.lists)?);
        let bookmarks =
            BookmarkStore::new(db.table(&config.tables.bookmarks)?, config.bookmark_policy);
        let player_configs = db.table(&config.tables.configs)?;

        let reconciler = Reconciler::new(bookmarks.clone());
        let scanner = Scanner::new(directories.clone(), config.scan.clone());
        let enricher = Arc::new(Enricher::new(probe, config.enrichment.concurrency));

        Ok(Self {
            jobs: EnrichmentJobs::with_history(enricher, config.enrichment.job_history),
            config,
            directories,
            lists,
            bookmarks,
            player_configs,
            reconciler,
            scanner,
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    fn table(&self, collection: Collection) -> &Table<ContentEntry> {
        match collection {
            Collection::Directories => &self.directories,
            Collection::Playlists | Collection::Books => self.lists.table(),
        }
    }

    /// Scan the configured media root
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        self.scanner.scan(&self.config.media_root, &self.config.base_url)
    }

    /// Entries of a collection with their progress
    pub fn list(&self, collection: Collection) -> Result<Vec<EntryView>, StoreError> {
        let entries = match collection {
            Collection::Directories => self.directories.list()?,
            Collection::Playlists => self.lists.playlists()?,
            Collection::Books => {
                // Listing books picks up a newer feed export
                if let Err(e) = self.refresh_feeds(false) {
                    warn!(error = %e, "Feed import failed, listing stored feeds");
                }
                self.lists.books()?
            }
        };

        self.reconciler.views(entries)
    }

    /// One entry with its progress
    pub fn get(&self, collection: Collection, id: &str) -> Result<EntryView, LibraryError> {
        self.reconciler.view(self.table(collection), id)
    }

    /// Files of one entry in playback order
    pub fn files(&self, collection: Collection, id: &str) -> Result<Vec<FileRef>, LibraryError> {
        self.table(collection)
            .get(id)?
            .map(|entry| entry.files)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    /// Remove an entry; the only way scanned entries ever disappear
    pub fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let removed = self.table(collection).delete(id)?;
        if removed {
            info!(id, ?collection, "Entry deleted");
        }
        Ok(removed)
    }

    /// Create or replace a curated playlist
    pub fn save_playlist(&self, entry: ContentEntry) -> Result<ContentEntry, ListError> {
        self.lists.save_playlist(entry)
    }

    /// Import the configured podcast export; `force` skips the staleness check
    pub fn refresh_feeds(&self, force: bool) -> Result<FeedImport, ListError> {
        match &self.config.podcast_file {
            Some(path) => self.lists.load_feed_file(path, force),
            None => Ok(FeedImport::Skipped),
        }
    }

    /// Queue a chapter enrichment pass; returns before it runs
    pub fn trigger_enrichment(
        &self,
        collection: Collection,
        force: bool,
    ) -> Result<JobTicket, JobError> {
        self.jobs.submit(self.table(collection).clone(), force)
    }

    pub fn job_status(&self, id: Uuid) -> Result<JobState, JobError> {
        self.jobs.status(id)
    }

    pub fn jobs(&self) -> Vec<JobState> {
        self.jobs.list()
    }

    pub fn save_bookmark(
        &self,
        bookmark: Bookmark,
        overwrite: bool,
    ) -> Result<SaveOutcome, StoreError> {
        self.bookmarks.save(bookmark, overwrite)
    }

    pub fn bookmark(&self, id: &str) -> Result<Bookmark, LibraryError> {
        self.bookmarks
            .get(id)?
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    pub fn bookmarks(&self) -> Result<Vec<Bookmark>, StoreError> {
        self.bookmarks.list()
    }

    pub fn delete_bookmark(&self, id: &str) -> Result<bool, StoreError> {
        self.bookmarks.delete(id)
    }

    /// Create or replace the player configuration of an entry
    pub fn save_player_config(&self, config: PlayerConfig) -> Result<PlayerConfig, StoreError> {
        self.player_configs.put(&config)?;
        Ok(config)
    }

    pub fn player_config(&self, id: &str) -> Result<PlayerConfig, LibraryError> {
        self.player_configs
            .get(id)?
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    pub fn delete_player_config(&self, id: &str) -> Result<bool, StoreError> {
        self.player_configs.delete(id)
    }
}
