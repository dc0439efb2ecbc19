//! Curated playlists and imported podcast feeds.
//!
//! Both share the [`ContentEntry`] shape in one table: playlists carry
//! `is_book = false`, feeds `is_book = true`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{ContentEntry, ContentId, FileRef};
use crate::store::{StoreError, Table};

/// Errors that can occur with lists and feed import
#[derive(Debug, Error)]
pub enum ListError {
    #[error("Playlist has no files: {0}")]
    EmptyPlaylist(String),

    #[error("IO error reading feed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed file parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// One episode of a podcatcher export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEpisode {
    pub filename: String,
    pub url: String,
}

/// Feed name to episode list, as exported by the podcatcher
pub type FeedMap = BTreeMap<String, Vec<FeedEpisode>>;

/// Result of a gated feed import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedImport {
    /// Source is older than the store; nothing was read
    Skipped,

    /// Number of feeds written
    Imported(usize),
}

/// Build the entry for one feed: first occurrence of a filename wins,
/// episodes end up sorted by filename.
pub fn feed_entry(name: &str, episodes: &[FeedEpisode]) -> ContentEntry {
    let mut seen = HashSet::new();
    let files = episodes
        .iter()
        .filter(|ep| seen.insert(ep.filename.as_str()))
        .map(|ep| FileRef::new(ep.filename.clone(), ep.url.clone()))
        .collect();

    let mut entry = ContentEntry {
        id: ContentId::new(name),
        name: name.to_string(),
        path: String::new(),
        url: String::new(),
        files,
        is_book: true,
    };
    entry.sort_files();
    entry
}

/// Playlists and feeds over one table
#[derive(Debug, Clone)]
pub struct ListStore {
    table: Table<ContentEntry>,
}

impl ListStore {
    pub fn new(table: Table<ContentEntry>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Table<ContentEntry> {
        &self.table
    }

    /// Curated playlists
    pub fn playlists(&self) -> Result<Vec<ContentEntry>, StoreError> {
        self.table.query("is_book", false)
    }

    /// Imported podcast/book feeds
    pub fn books(&self) -> Result<Vec<ContentEntry>, StoreError> {
        self.table.query("is_book", true)
    }

    /// Create or replace a curated playlist.
    ///
    /// An empty id gets a fresh one. Files are put into playback order.
    pub fn save_playlist(&self, mut entry: ContentEntry) -> Result<ContentEntry, ListError> {
        if entry.id.as_str().is_empty() {
            entry.id = ContentId::new(Uuid::new_v4().to_string());
        }
        if entry.files.is_empty() {
            return Err(ListError::EmptyPlaylist(entry.id.to_string()));
        }

        entry.is_book = false;
        entry.sort_files();
        self.table.put(&entry)?;

        Ok(entry)
    }

    /// Upsert one entry per feed. Episodes missing from a newer export
    /// disappear only because the whole entry is replaced.
    pub fn import_feeds(&self, feeds: &FeedMap) -> Result<Vec<ContentEntry>, StoreError> {
        let mut imported = Vec::with_capacity(feeds.len());

        for (name, episodes) in feeds {
            let entry = feed_entry(name, episodes);
            if entry.files.is_empty() {
                debug!(feed = %name, "Skipping feed without episodes");
                continue;
            }
            self.table.put(&entry)?;
            imported.push(entry);
        }

        Ok(imported)
    }

    /// Import a podcatcher YAML export.
    ///
    /// Unless `force` is set, the file is skipped when it is older than the
    /// database, which means it has already been imported.
    pub fn load_feed_file(&self, path: &Path, force: bool) -> Result<FeedImport, ListError> {
        if !force && !self.source_is_newer(path)? {
            debug!(path = %path.display(), "Feed file unchanged since last import");
            return Ok(FeedImport::Skipped);
        }

        let content = std::fs::read_to_string(path)?;
        let feeds: FeedMap = serde_yaml::from_str(&content)?;
        let imported = self.import_feeds(&feeds)?;

        info!(path = %path.display(), feeds = imported.len(), "Imported podcast feeds");
        Ok(FeedImport::Imported(imported.len()))
    }

    fn source_is_newer(&self, path: &Path) -> Result<bool, ListError> {
        let source = std::fs::metadata(path)?.modified()?;

        Ok(match self.table.database().modified() {
            Some(store) => source >= store,
            None => true,
        })
    }
}
