//! Player configuration CLI subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::core::Library;
use crate::domain::PlayerConfig;

use super::print_json;

/// Player-config subcommands
#[derive(Subcommand, Debug)]
pub enum PlayerConfigCommands {
    /// Store a configuration from a JSON file
    Set {
        /// JSON file with {id, sources, settings, timestamp}
        input: PathBuf,
    },

    /// Show the configuration of an entry
    Get {
        /// Entry ID
        id: String,
    },

    /// Delete the configuration of an entry
    Delete {
        /// Entry ID
        id: String,
    },
}

/// Execute player-config subcommands
pub fn execute(library: &Library, command: PlayerConfigCommands) -> Result<()> {
    match command {
        PlayerConfigCommands::Set { input } => {
            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read config file: {}", input.display()))?;
            let config: PlayerConfig = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse player config: {}", input.display()))?;

            print_json(&library.save_player_config(config)?)
        }
        PlayerConfigCommands::Get { id } => print_json(&library.player_config(&id)?),
        PlayerConfigCommands::Delete { id } => {
            if !library.delete_player_config(&id)? {
                eprintln!("No player config for {}", id);
            }
            Ok(())
        }
    }
}
