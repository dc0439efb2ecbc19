//! audioshelf - Audio library indexer with playback progress
//!
//! Indexes a tree of albums and audiobooks, keeps playlists and imported
//! podcast feeds alongside, and joins every entry with its bookmark to
//! report how far along the listener is.
//!
//! # Architecture
//!
//! ```text
//! Scanner ──┐
//!           ├──▶ Store (SQLite tables) ◀── Enrichment jobs (background)
//! ListStore ┘           │
//!                       ▼
//!                  Reconciler ──▶ EntryView { bookmark, state }
//! ```
//!
//! # Modules
//!
//! - `store`: Generic key-value tables over SQLite
//! - `library`: Filesystem scanner, playlists and feed import
//! - `playback`: Bookmarks and progress reconciliation
//! - `enrich`: Chapter probing and background jobs
//! - `core`: Library facade used by front ends
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Index the media root
//! audioshelf scan
//!
//! # List audiobooks with progress
//! audioshelf list --collection directories
//!
//! # Attach chapter markers
//! audioshelf enrich --force
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod enrich;
pub mod library;
pub mod playback;
pub mod store;

// Re-export main types at crate root for convenience
pub use config::ResolvedConfig;
pub use core::{Collection, Library};
pub use domain::{
    Bookmark, Chapter, ContentEntry, ContentId, FileRef, PlayerConfig, ProgressState,
};
pub use enrich::{ChapterProbe, EnrichReport, Enricher, JobState, JobStatus};
pub use library::{ListStore, ScanReport, Scanner};
pub use playback::{BookmarkPolicy, EntryView, Reconciler};
pub use store::{Database, Record, Table};
