//! Persistent key-value tables backed by SQLite.
//!
//! Every logical table holds one record type, keyed by the record's `id`,
//! with the record body stored as JSON:
//!
//! ```text
//! library.db
//! ├── directories   (id TEXT PRIMARY KEY, body TEXT)  scanned entries
//! ├── lists         (id TEXT PRIMARY KEY, body TEXT)  playlists + feeds
//! └── bookmarks     (id TEXT PRIMARY KEY, body TEXT)  last positions
//! ```
//!
//! All operations are synchronous. A single connection sits behind a mutex,
//! so a reader never observes a half-written row.

pub mod table;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use table::Table;

/// Errors that can occur in the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    #[error("Store connection poisoned by a panicked writer")]
    Poisoned,
}

/// A value that can live in a [`Table`]
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Primary key of the record
    fn id(&self) -> &str;
}

/// Shared SQLite database holding all tables
pub struct Database {
    conn: Mutex<Connection>,

    /// Backing file, `None` for in-memory databases
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Arc<Self>, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        Ok(Arc::new(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        }))
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Arc<Self>, StoreError> {
        Ok(Arc::new(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        }))
    }

    /// Path of the backing file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Last modification time of the backing file
    pub fn modified(&self) -> Option<SystemTime> {
        let path = self.path.as_ref()?;
        std::fs::metadata(path).ok()?.modified().ok()
    }

    /// Get a typed handle to a table, creating it if needed
    pub fn table<T: Record>(self: &Arc<Self>, name: &str) -> Result<Table<T>, StoreError> {
        validate_table_name(name)?;

        self.connection()?.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {name} (
                id   TEXT PRIMARY KEY,
                body TEXT NOT NULL
            )"
        ))?;

        Ok(Table::new(Arc::clone(self), name))
    }

    pub(crate) fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTable(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("directories").is_ok());
        assert!(validate_table_name("_lists2").is_ok());

        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("2lists").is_err());
        assert!(validate_table_name("lists; DROP TABLE x").is_err());
        assert!(validate_table_name("book-marks").is_err());
    }

    #[test]
    fn test_in_memory_has_no_mtime() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());
        assert!(db.modified().is_none());
    }

    #[test]
    fn test_file_database_reports_mtime() {
        let temp = tempfile::TempDir::new().unwrap();
        let db = Database::open(&temp.path().join("nested").join("library.db")).unwrap();
        db.connection()
            .unwrap()
            .execute_batch("CREATE TABLE probe (x INTEGER)")
            .unwrap();

        assert!(db.modified().is_some());
    }
}
