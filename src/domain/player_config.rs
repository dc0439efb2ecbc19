//! Per-entry player configuration stored on behalf of the playback client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Record;

/// Client-owned settings for one album, book or feed.
///
/// `sources` and `settings` are opaque to the library and round-trip as
/// given; the `id` is the id of the entry they apply to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub id: String,

    /// Playback sources chosen by the client
    #[serde(default)]
    pub sources: Value,

    /// Free-form player settings (speed, volume, ...)
    #[serde(default)]
    pub settings: Value,

    /// Client timestamp of the last change, epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Record for PlayerConfig {
    fn id(&self) -> &str {
        &self.id
    }
}
