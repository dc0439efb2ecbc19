//! Core library wiring.
//!
//! This module contains:
//! - Library: Facade over scanning, lists, bookmarks and enrichment
//! - Collection: The partitions a front end can address

pub mod library;

// Re-export commonly used types
pub use library::{Collection, Library};
