//! Playback state: bookmarks and progress reconciliation.
//!
//! Bookmarks are written by the playback client; the reconciler only reads
//! them and never writes back.

pub mod bookmarks;
pub mod reconciler;

pub use bookmarks::{BookmarkPolicy, BookmarkStore, SaveOutcome};
pub use reconciler::{EntryView, LibraryError, Reconciler};
