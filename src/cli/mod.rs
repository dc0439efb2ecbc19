//! Command-line interface for audioshelf.
//!
//! Provides commands for scanning the media tree, listing entries with
//! their playback progress, managing bookmarks, playlists and player
//! configuration, importing podcast feeds and running chapter enrichment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config;
use crate::core::{Collection, Library};
use crate::domain::ContentEntry;
use crate::enrich::JobStatus;
use crate::library::FeedImport;

pub mod bookmark;
pub mod player_config;

/// audioshelf - Audio library indexer with playback progress
#[derive(Parser, Debug)]
#[command(name = "audioshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the media root for albums and audiobooks
    Scan,

    /// List entries with their progress
    List {
        /// Collection to list
        #[arg(short, long, value_enum, default_value = "directories")]
        collection: Collection,
    },

    /// Show one entry with its progress
    Show {
        /// Entry ID
        id: String,

        #[arg(short, long, value_enum, default_value = "directories")]
        collection: Collection,
    },

    /// Show the files of an entry in playback order
    Files {
        /// Entry ID
        id: String,

        #[arg(short, long, value_enum, default_value = "directories")]
        collection: Collection,
    },

    /// Delete an entry from the index
    Delete {
        /// Entry ID
        id: String,

        #[arg(short, long, value_enum, default_value = "directories")]
        collection: Collection,
    },

    /// Create or replace a playlist from a JSON file
    Playlist {
        /// JSON file with {name, files: [{name, url}]} and an optional id
        input: PathBuf,
    },

    /// Import podcast feeds from the configured export
    ImportFeeds {
        /// Import even if the export has not changed
        #[arg(short, long)]
        force: bool,
    },

    /// Attach chapter metadata to files
    Enrich {
        #[arg(short, long, value_enum, default_value = "directories")]
        collection: Collection,

        /// Recompute chapters that are already present
        #[arg(short, long)]
        force: bool,
    },

    /// Manage bookmarks
    Bookmark {
        #[command(subcommand)]
        command: bookmark::BookmarkCommands,
    },

    /// Manage per-entry player configuration
    PlayerConfig {
        #[command(subcommand)]
        command: player_config::PlayerConfigCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load()?;

        if let Commands::Config = self.command {
            return print_json(&cfg);
        }

        let library = Library::open(cfg)?;

        match self.command {
            Commands::Scan => scan(&library),
            Commands::List { collection } => print_json(&library.list(collection)?),
            Commands::Show { id, collection } => print_json(&library.get(collection, &id)?),
            Commands::Files { id, collection } => print_json(&library.files(collection, &id)?),
            Commands::Delete { id, collection } => {
                if !library.delete(collection, &id)? {
                    eprintln!("No entry {} in {:?}", id, collection);
                }
                Ok(())
            }
            Commands::Playlist { input } => save_playlist(&library, input),
            Commands::ImportFeeds { force } => import_feeds(&library, force),
            Commands::Enrich { collection, force } => enrich(&library, collection, force).await,
            Commands::Bookmark { command } => bookmark::execute(&library, command),
            Commands::PlayerConfig { command } => player_config::execute(&library, command),
            Commands::Config => Ok(()),
        }
    }
}

/// Pretty-print a value as JSON on stdout
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn scan(library: &Library) -> Result<()> {
    let report = library.scan()?;

    println!("{:<66} {:<6} {:>5}  NAME", "ID", "KIND", "FILES");
    println!("{}", "-".repeat(100));
    for entry in &report.entries {
        let kind = if entry.is_book { "book" } else { "album" };
        println!("{:<66} {:<6} {:>5}  {}", entry.id, kind, entry.files.len(), entry.name);
    }

    eprintln!(
        "\n[{} albums, {} books, {} skipped in {}ms]",
        report.albums, report.books, report.skipped, report.elapsed_ms
    );
    Ok(())
}

fn save_playlist(library: &Library, input: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read playlist file: {}", input.display()))?;
    let entry: ContentEntry = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse playlist: {}", input.display()))?;

    print_json(&library.save_playlist(entry)?)
}

fn import_feeds(library: &Library, force: bool) -> Result<()> {
    if library.config().podcast_file.is_none() {
        anyhow::bail!("No podcast file configured (paths.podcast_file or AUDIOSHELF_PODCAST_FILE)");
    }

    match library.refresh_feeds(force)? {
        FeedImport::Skipped => eprintln!("Podcast export unchanged; use --force to re-import"),
        FeedImport::Imported(n) => eprintln!("Imported {} feeds", n),
    }
    Ok(())
}

/// Run enrichment and wait; the process would otherwise exit mid-pass
async fn enrich(library: &Library, collection: Collection, force: bool) -> Result<()> {
    let ticket = library.trigger_enrichment(collection, force)?;
    eprintln!("[Enrichment job {} queued]", ticket.id);

    let state = ticket.wait().await;
    print_json(&state)?;

    if state.status == JobStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}
