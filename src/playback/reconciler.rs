//! Joins content entries with their bookmarks.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{Bookmark, ContentEntry, ContentId, ProgressState};
use crate::store::{StoreError, Table};

use super::bookmarks::BookmarkStore;

/// Errors for reads by id
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Entry not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Entry identity plus its bookmark and computed progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryView {
    pub id: ContentId,
    pub name: String,
    pub is_book: bool,

    /// Raw bookmark, absent when the entry was never started
    pub bookmark: Option<Bookmark>,

    pub state: ProgressState,
}

/// Read-only progress reconciliation
#[derive(Debug, Clone)]
pub struct Reconciler {
    bookmarks: BookmarkStore,
}

impl Reconciler {
    pub fn new(bookmarks: BookmarkStore) -> Self {
        Self { bookmarks }
    }

    /// View of one entry in `table`
    pub fn view(&self, table: &Table<ContentEntry>, id: &str) -> Result<EntryView, LibraryError> {
        let entry = table
            .get(id)?
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;

        Ok(self.reconcile(entry)?)
    }

    /// Views of a set of entries, in the given order
    pub fn views(&self, entries: Vec<ContentEntry>) -> Result<Vec<EntryView>, StoreError> {
        entries.into_iter().map(|e| self.reconcile(e)).collect()
    }

    /// Merge an entry with its bookmark
    pub fn reconcile(&self, entry: ContentEntry) -> Result<EntryView, StoreError> {
        let bookmark = self.bookmarks.get(entry.id.as_str())?;

        if let Some(mark) = &bookmark {
            if entry.position_of(&mark.file).is_none() {
                warn!(id = %entry.id, file = %mark.file, "Bookmark references a missing file");
            }
        }

        let state = ProgressState::compute(&entry.files, bookmark.as_ref());

        Ok(EntryView {
            id: entry.id,
            name: entry.name,
            is_book: entry.is_book,
            bookmark,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileRef;
    use crate::playback::BookmarkPolicy;
    use crate::store::Database;

    fn setup() -> (Table<ContentEntry>, BookmarkStore, Reconciler) {
        let db = Database::open_in_memory().unwrap();
        let entries = db.table("directories").unwrap();
        let bookmarks =
            BookmarkStore::new(db.table("bookmarks").unwrap(), BookmarkPolicy::default());
        let reconciler = Reconciler::new(bookmarks.clone());
        (entries, bookmarks, reconciler)
    }

    fn entry(id: &str) -> ContentEntry {
        ContentEntry {
            id: ContentId::new(id),
            name: id.to_uppercase(),
            path: format!("/media/{}", id),
            url: format!("/{}", id),
            files: ["a", "b", "c"]
                .iter()
                .map(|n| FileRef::new(*n, format!("/{}/{}", id, n)))
                .collect(),
            is_book: true,
        }
    }

    #[test]
    fn test_view_not_found() {
        let (entries, _, reconciler) = setup();
        let result = reconciler.view(&entries, "missing");
        assert!(matches!(result, Err(LibraryError::NotFound(id)) if id == "missing"));
    }

    #[test]
    fn test_view_merges_bookmark() {
        let (entries, bookmarks, reconciler) = setup();
        entries.put(&entry("x")).unwrap();
        bookmarks.save(Bookmark::new("x", "b", 33.0), false).unwrap();

        let view = reconciler.view(&entries, "x").unwrap();
        assert_eq!(view.name, "X");
        assert!(view.is_book);
        assert_eq!(view.bookmark, Some(Bookmark::new("x", "b", 33.0)));
        assert_eq!(
            view.state,
            ProgressState {
                finished: false,
                unread: 1
            }
        );
    }

    #[test]
    fn test_view_does_not_mutate() {
        let (entries, bookmarks, reconciler) = setup();
        entries.put(&entry("x")).unwrap();
        bookmarks.save(Bookmark::new("x", "gone.mp3", 1.0), false).unwrap();

        let view = reconciler.view(&entries, "x").unwrap();
        assert_eq!(view.state, ProgressState::CAUGHT_UP);

        assert_eq!(entries.get("x").unwrap(), Some(entry("x")));
        assert_eq!(bookmarks.get("x").unwrap(), Some(Bookmark::new("x", "gone.mp3", 1.0)));
    }

    #[test]
    fn test_views_keep_order() {
        let (_, bookmarks, reconciler) = setup();
        bookmarks.save(Bookmark::new("y", "a", 0.0), false).unwrap();

        let views = reconciler.views(vec![entry("y"), entry("x")]).unwrap();
        assert_eq!(views[0].id.as_str(), "y");
        assert_eq!(views[0].state.unread, 2);
        assert_eq!(views[1].id.as_str(), "x");
        assert_eq!(views[1].bookmark, None);
        assert_eq!(views[1].state, ProgressState::CAUGHT_UP);
    }
}
