//! Filesystem scanner.
//!
//! Walks a media tree and turns every directory holding audio files into a
//! [`ContentEntry`]. A directory containing the marker file starts an
//! audiobook subtree: it and all of its descendants are indexed with
//! `is_book = true`, and no further marker checks happen below it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ScanSettings;
use crate::domain::{ContentEntry, ContentId, FileRef};
use crate::store::{StoreError, Table};

/// Errors that abort a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Scan root not found: {path}: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Outcome of one scan
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Entries found during this scan, in walk order
    pub entries: Vec<ContentEntry>,

    /// Directories classified as albums
    pub albums: usize,

    /// Directories classified as audiobooks
    pub books: usize,

    /// Unreadable subtrees that were skipped, each counted once
    pub skipped: usize,

    pub elapsed_ms: u64,
}

/// Audio files and marker presence for one directory
#[derive(Debug, Default)]
struct DirListing {
    audio_files: Vec<String>,
    has_marker: bool,
}

/// Scanner writing entries into a table
pub struct Scanner {
    table: Table<ContentEntry>,
    settings: ScanSettings,
}

impl Scanner {
    pub fn new(table: Table<ContentEntry>, settings: ScanSettings) -> Self {
        Self { table, settings }
    }

    /// Table the scanner writes to
    pub fn table(&self) -> &Table<ContentEntry> {
        &self.table
    }

    /// Scan `root`, serving it from `base_url`.
    ///
    /// Entries for directories that no longer exist are left in place;
    /// removing them is a separate, explicit delete. Chapter data of files
    /// that are still present survives a rescan, and unchanged entries are
    /// not rewritten.
    pub fn scan(&self, root: &Path, base_url: &str) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        let root = root.canonicalize().map_err(|source| ScanError::RootNotFound {
            path: root.to_path_buf(),
            source,
        })?;

        let mut report = ScanReport::default();
        // Books never nest, so one open subtree at a time is enough
        let mut book_root: Option<PathBuf> = None;
        let mut failed: HashSet<Option<PathBuf>> = HashSet::new();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        for item in walker {
            let dir = match item {
                Ok(entry) if entry.file_type().is_dir() => entry.into_path(),
                Ok(_) => continue,
                Err(e) => {
                    warn!(path = ?e.path(), error = %e, "Skipping unreadable subtree");
                    failed.insert(e.path().map(Path::to_path_buf));
                    continue;
                }
            };

            let in_book = book_root.as_ref().is_some_and(|b| dir.starts_with(b));
            let listing = match self.list_dir(&dir, !in_book) {
                Ok(listing) => listing,
                Err(e) => {
                    // walkdir reports the same directory again when it fails to descend
                    warn!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                    failed.insert(Some(dir));
                    continue;
                }
            };

            let is_book = if in_book {
                true
            } else if listing.has_marker {
                debug!(path = %dir.display(), "Audiobook marker found");
                book_root = Some(dir.clone());
                true
            } else {
                false
            };

            if listing.audio_files.is_empty() {
                continue;
            }

            let mut entry = build_entry(&root, &dir, base_url, listing.audio_files, is_book);
            match self.table.get(entry.id.as_str())? {
                Some(previous) => {
                    entry.carry_chapters(&previous);
                    if previous == entry {
                        debug!(id = %entry.id, "Entry unchanged");
                    } else {
                        self.table.put(&entry)?;
                    }
                }
                None => self.table.put(&entry)?,
            }

            if entry.is_book {
                report.books += 1;
            } else {
                report.albums += 1;
            }
            report.entries.push(entry);
        }

        report.skipped = failed.len();
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            root = %root.display(),
            albums = report.albums,
            books = report.books,
            skipped = report.skipped,
            elapsed_ms = report.elapsed_ms,
            "Scan completed"
        );

        Ok(report)
    }

    /// Read one directory level, collecting audio file names
    fn list_dir(&self, dir: &Path, check_marker: bool) -> std::io::Result<DirListing> {
        let mut listing = DirListing::default();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };

            if check_marker && name == self.settings.marker_file {
                listing.has_marker = true;
            } else if self.is_audio_file(&entry.path()) {
                listing.audio_files.push(name);
            }
        }

        Ok(listing)
    }

    /// Check if a path is a regular (or linked) file with an audio extension
    fn is_audio_file(&self, path: &Path) -> bool {
        let matches_ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.settings
                    .extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false);

        // is_file follows links, so dangling symlinks drop out here
        matches_ext && path.is_file()
    }
}

fn build_entry(
    root: &Path,
    dir: &Path,
    base_url: &str,
    mut names: Vec<String>,
    is_book: bool,
) -> ContentEntry {
    names.sort();

    let url = directory_url(root, dir, base_url);
    let files = names
        .into_iter()
        .map(|name| {
            let file_url = join_url(&url, &name);
            FileRef::new(name, file_url)
        })
        .collect();

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string_lossy().into_owned());

    ContentEntry {
        id: ContentId::from_path(dir),
        name,
        path: dir.to_string_lossy().into_owned(),
        url,
        files,
        is_book,
    }
}

/// Rewrite a directory under `root` into a URL under `base_url`
pub fn directory_url(root: &Path, dir: &Path, base_url: &str) -> String {
    let relative: Vec<String> = dir
        .strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    if relative.is_empty() {
        if base_url.is_empty() {
            "/".to_string()
        } else {
            base_url.to_string()
        }
    } else {
        join_url(base_url, &relative.join("/"))
    }
}

fn join_url(base: &str, tail: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), tail)
}
