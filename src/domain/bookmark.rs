//! Last listened position for a content entry.

use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Last played file and offset for one entry.
///
/// The bookmark `id` is the id of the entry it belongs to, so there is at
/// most one bookmark per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Id of the bookmarked entry
    pub id: String,

    /// Display name of the entry, as sent by the player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name of the file being played
    pub file: String,

    /// Offset inside the file, seconds
    pub time: f64,
}

impl Bookmark {
    pub fn new(id: impl Into<String>, file: impl Into<String>, time: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            file: file.into(),
            time,
        }
    }

    /// Whether this bookmark is strictly further along than `other`
    pub fn is_after(&self, other: &Bookmark) -> bool {
        self.file > other.file || (self.file == other.file && self.time > other.time)
    }
}

impl Record for Bookmark {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_after() {
        let early = Bookmark::new("book", "01.mp3", 120.0);
        let later_same_file = Bookmark::new("book", "01.mp3", 300.0);
        let next_file = Bookmark::new("book", "02.mp3", 0.0);

        assert!(later_same_file.is_after(&early));
        assert!(next_file.is_after(&later_same_file));
        assert!(!early.is_after(&early));
        assert!(!early.is_after(&next_file));
    }
}
