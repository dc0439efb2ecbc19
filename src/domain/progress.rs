//! Playback progress derived from an entry and its bookmark.

use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;
use super::entry::FileRef;

/// Derived, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Bookmark sits on the last file (or there is nothing to catch up on)
    pub finished: bool,

    /// Files strictly after the bookmarked one
    pub unread: usize,
}

impl ProgressState {
    /// Nothing left to catch up on
    pub const CAUGHT_UP: ProgressState = ProgressState {
        finished: true,
        unread: 0,
    };

    /// Compute progress for an ordered file list.
    ///
    /// No bookmark means the entry was never started, which counts as caught up.
    /// A bookmark naming a file that is no longer in the list also resolves to
    /// caught up.
    pub fn compute(files: &[FileRef], bookmark: Option<&Bookmark>) -> Self {
        let Some(bookmark) = bookmark else {
            return Self::CAUGHT_UP;
        };

        match files.iter().position(|f| f.name == bookmark.file) {
            Some(index) => Self {
                finished: index + 1 == files.len(),
                unread: files.len() - index - 1,
            },
            None => Self::CAUGHT_UP,
        }
    }
}
