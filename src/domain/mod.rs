//! Domain types for the audio library.
//!
//! This module contains the core data structures:
//! - ContentEntry: An indexed album, audiobook, feed or playlist
//! - Bookmark: Last listened position for an entry
//! - ProgressState: Progress derived from the two
//! - PlayerConfig: Client settings stored per entry

pub mod bookmark;
pub mod entry;
pub mod player_config;
pub mod progress;

// Re-export commonly used types
pub use bookmark::Bookmark;
pub use entry::{Chapter, ContentEntry, ContentId, FileRef};
pub use player_config::PlayerConfig;
pub use progress::ProgressState;
