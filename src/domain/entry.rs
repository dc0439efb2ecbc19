//! Indexed content entries and their playable files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::store::Record;

/// Content identifier (hex SHA256 of the absolute directory path)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Create a content ID from an absolute filesystem path
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an existing identifier (feed names, playlist ids)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A chapter marker inside a single audio file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,

    /// Offset from the start of the file, whole seconds
    pub start_time: u64,
}

/// A playable file belonging to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// File name, also the sort key for playback order
    pub name: String,

    /// Servable URL of the file
    pub url: String,

    /// Chapter markers; `None` until enrichment has visited the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<Vec<Chapter>>,
}

impl FileRef {
    /// Create a file reference without chapter data
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            chapters: None,
        }
    }

    /// Whether enrichment has already run for this file
    pub fn is_enriched(&self) -> bool {
        self.chapters.is_some()
    }
}

/// An indexed album, audiobook, podcast feed or curated playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Empty for a playlist that has not been saved yet
    #[serde(default)]
    pub id: ContentId,

    /// Display name (directory base name, feed name or playlist title)
    pub name: String,

    /// Absolute directory path; empty for playlists and feeds
    #[serde(default)]
    pub path: String,

    /// Servable URL of the directory; empty for playlists and feeds
    #[serde(default)]
    pub url: String,

    /// Files in playback order
    pub files: Vec<FileRef>,

    /// Audiobook/podcast (sequential) rather than album/playlist
    #[serde(default)]
    pub is_book: bool,
}

impl ContentEntry {
    /// Sort files into playback order (by name)
    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Position of a file in playback order
    pub fn position_of(&self, file_name: &str) -> Option<usize> {
        self.files.iter().position(|f| f.name == file_name)
    }

    /// Take chapter data from a previous version of this entry for files
    /// that are still present under the same name
    pub fn carry_chapters(&mut self, previous: &ContentEntry) {
        for file in self.files.iter_mut().filter(|f| f.chapters.is_none()) {
            file.chapters = previous
                .files
                .iter()
                .find(|old| old.name == file.name)
                .and_then(|old| old.chapters.clone());
        }
    }

    /// Remove all chapter data so the next enrichment recomputes it
    pub fn strip_chapters(&mut self) {
        for file in &mut self.files {
            file.chapters = None;
        }
    }
}

impl Record for ContentEntry {
    fn id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_from_path() {
        let id1 = ContentId::from_path(Path::new("/music/Album1"));
        let id2 = ContentId::from_path(Path::new("/music/Album1"));
        let id3 = ContentId::from_path(Path::new("/music/Album2"));

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1.as_str().len(), 64); // 32 bytes = 64 hex chars
        assert!(id1.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_chapters_omitted_until_enriched() {
        let file = FileRef::new("01.mp3", "/books/01.mp3");
        let json = serde_json::to_value(&file).unwrap();
        assert!(json.get("chapters").is_none());

        let parsed: FileRef = serde_json::from_value(json).unwrap();
        assert!(!parsed.is_enriched());
    }

    #[test]
    fn test_empty_chapter_list_counts_as_enriched() {
        let file: FileRef =
            serde_json::from_str(r#"{"name":"a.mp3","url":"/a.mp3","chapters":[]}"#).unwrap();
        assert!(file.is_enriched());
    }

    #[test]
    fn test_sort_and_position() {
        let mut entry = ContentEntry {
            id: ContentId::new("x"),
            name: "x".to_string(),
            path: String::new(),
            url: String::new(),
            files: vec![FileRef::new("c", "c"), FileRef::new("a", "a"), FileRef::new("b", "b")],
            is_book: false,
        };
        entry.sort_files();

        assert_eq!(entry.position_of("a"), Some(0));
        assert_eq!(entry.position_of("c"), Some(2));
        assert_eq!(entry.position_of("zz"), None);
    }

    #[test]
    fn test_carry_chapters_by_name() {
        let chapter = Chapter {
            title: "Intro".to_string(),
            start_time: 0,
        };
        let mut previous = ContentEntry {
            id: ContentId::new("x"),
            name: "x".to_string(),
            path: String::new(),
            url: String::new(),
            files: vec![FileRef::new("a", "a"), FileRef::new("gone", "gone")],
            is_book: false,
        };
        for file in &mut previous.files {
            file.chapters = Some(vec![chapter.clone()]);
        }

        let mut rescanned = previous.clone();
        rescanned.files = vec![FileRef::new("a", "a"), FileRef::new("new", "new")];
        rescanned.carry_chapters(&previous);

        assert_eq!(rescanned.files[0].chapters, Some(vec![chapter]));
        assert_eq!(rescanned.files[1].chapters, None);
    }

    #[test]
    fn test_id_defaults_to_empty() {
        let json = r#"{"name": "Road trip", "files": [{"name": "a.mp3", "url": "/a.mp3"}]}"#;
        let entry: ContentEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id.as_str(), "");
        assert!(!entry.is_book);
    }
}
