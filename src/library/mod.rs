//! Indexing of audio content.
//!
//! Two sources feed the library:
//! - `scanner`: directories with audio files under the media root
//! - `lists`: curated playlists and imported podcast feeds
//!
//! # Classification
//!
//! ```text
//! /media/
//! ├── Album1/              album   (is_book = false)
//! │   ├── a.mp3
//! │   └── b.mp3
//! └── Book1/               book    (is_book = true)
//!     ├── .audiobook       marker, flips the whole subtree
//!     ├── 01.mp3
//!     └── Part2/           book    (inherited)
//!         └── 01.mp3
//! ```

pub mod lists;
pub mod scanner;

pub use lists::{feed_entry, FeedEpisode, FeedImport, FeedMap, ListError, ListStore};
pub use scanner::{ScanError, ScanReport, Scanner};
