//! Bookmark persistence with a configurable save policy.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Bookmark;
use crate::store::{StoreError, Table};

/// How a new bookmark treats an existing one for the same entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkPolicy {
    /// Every update replaces the stored bookmark
    #[default]
    LastWriteWins,

    /// Updates behind the stored position are rejected unless overwritten
    Monotonic,
}

/// Result of saving a bookmark
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(Bookmark),

    /// Stored bookmark is further along; it was kept
    Rejected { current: Bookmark },
}

/// Bookmarks over one table
#[derive(Debug, Clone)]
pub struct BookmarkStore {
    table: Table<Bookmark>,
    policy: BookmarkPolicy,
}

impl BookmarkStore {
    pub fn new(table: Table<Bookmark>, policy: BookmarkPolicy) -> Self {
        Self { table, policy }
    }

    pub fn policy(&self) -> BookmarkPolicy {
        self.policy
    }

    /// Save a bookmark; `overwrite` bypasses the monotonic check
    pub fn save(&self, bookmark: Bookmark, overwrite: bool) -> Result<SaveOutcome, StoreError> {
        if self.policy == BookmarkPolicy::Monotonic && !overwrite {
            if let Some(current) = self.table.get(&bookmark.id)? {
                if current.is_after(&bookmark) {
                    debug!(
                        id = %bookmark.id,
                        file = %bookmark.file,
                        "Rejected bookmark behind stored position"
                    );
                    return Ok(SaveOutcome::Rejected { current });
                }
            }
        }

        self.table.put(&bookmark)?;
        Ok(SaveOutcome::Saved(bookmark))
    }

    pub fn get(&self, id: &str) -> Result<Option<Bookmark>, StoreError> {
        self.table.get(id)
    }

    pub fn list(&self) -> Result<Vec<Bookmark>, StoreError> {
        self.table.list()
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.table.delete(id)
    }
}
