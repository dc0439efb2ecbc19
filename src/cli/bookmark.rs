//! Bookmark CLI subcommands.
//!
//! Provides commands to:
//! - `set`: Record the last listened position of an entry
//! - `get`: Show the bookmark of an entry
//! - `list`: Show all bookmarks
//! - `delete`: Forget the bookmark of an entry

use anyhow::Result;
use clap::Subcommand;

use crate::core::Library;
use crate::domain::Bookmark;
use crate::playback::SaveOutcome;

use super::print_json;

/// Bookmark-related subcommands
#[derive(Subcommand, Debug)]
pub enum BookmarkCommands {
    /// Record a position
    Set {
        /// Entry ID
        id: String,

        /// File name inside the entry
        file: String,

        /// Offset in seconds
        time: f64,

        /// Display name of the entry
        #[arg(long)]
        name: Option<String>,

        /// Save even if the stored bookmark is further along
        #[arg(long)]
        overwrite: bool,
    },

    /// Show the bookmark of an entry
    Get {
        /// Entry ID
        id: String,
    },

    /// List all bookmarks
    List,

    /// Delete the bookmark of an entry
    Delete {
        /// Entry ID
        id: String,
    },
}

/// Execute bookmark subcommands
pub fn execute(library: &Library, command: BookmarkCommands) -> Result<()> {
    match command {
        BookmarkCommands::Set {
            id,
            file,
            time,
            name,
            overwrite,
        } => {
            let mut bookmark = Bookmark::new(id, file, time);
            bookmark.name = name;

            match library.save_bookmark(bookmark, overwrite)? {
                SaveOutcome::Saved(saved) => print_json(&saved),
                SaveOutcome::Rejected { current } => {
                    eprintln!("Stored bookmark is further along; use --overwrite to replace it");
                    print_json(&current)?;
                    std::process::exit(1);
                }
            }
        }
        BookmarkCommands::Get { id } => print_json(&library.bookmark(&id)?),
        BookmarkCommands::List => print_json(&library.bookmarks()?),
        BookmarkCommands::Delete { id } => {
            if !library.delete_bookmark(&id)? {
                eprintln!("No bookmark for {}", id);
            }
            Ok(())
        }
    }
}
