//! Configuration for audioshelf.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (AUDIOSHELF_HOME, AUDIOSHELF_MEDIA_ROOT,
//!    AUDIOSHELF_BASE_URL, AUDIOSHELF_PODCAST_FILE)
//! 2. Config file (.audioshelf/config.yaml)
//! 3. Defaults (~/.audioshelf, media root = home directory, base url "/")
//!
//! Config file discovery:
//! - Searches the start directory and its parents for .audioshelf/config.yaml
//! - Paths in the config file are relative to the project root (the parent
//!   of .audioshelf/)
//!
//! The resolved configuration is a plain value handed to constructors; there
//! is no process-wide cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::enrich::DEFAULT_JOB_HISTORY;
use crate::playback::BookmarkPolicy;

const CONFIG_DIR: &str = ".audioshelf";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub scan: Option<ScanConfig>,
    #[serde(default)]
    pub tables: Option<TablesConfig>,
    #[serde(default)]
    pub enrichment: Option<EnrichmentConfig>,
    #[serde(default)]
    pub bookmarks: Option<BookmarksConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
    /// Root of the media tree to scan
    pub media_root: Option<String>,
    /// SQLite database file
    pub database: Option<String>,
    /// Podcatcher YAML export
    pub podcast_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub marker_file: Option<String>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    pub directories: Option<String>,
    pub lists: Option<String>,
    pub bookmarks: Option<String>,
    pub configs: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub concurrency: Option<usize>,
    pub probe_binary: Option<String>,
    pub probe_timeout_seconds: Option<u64>,
    pub job_history: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookmarksConfig {
    pub policy: Option<BookmarkPolicy>,
}

/// Settings used by the filesystem scanner
#[derive(Debug, Clone, Serialize)]
pub struct ScanSettings {
    /// File whose presence flips a subtree to audiobook mode
    pub marker_file: String,
    /// Audio extensions, without the dot
    pub extensions: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            marker_file: ".audiobook".to_string(),
            extensions: vec!["mp3".to_string(), "ogg".to_string(), "m4a".to_string()],
        }
    }
}

/// Table names inside the database
#[derive(Debug, Clone, Serialize)]
pub struct TableNames {
    pub directories: String,
    pub lists: String,
    pub bookmarks: String,
    pub configs: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            directories: "directories".to_string(),
            lists: "lists".to_string(),
            bookmarks: "bookmarks".to_string(),
            configs: "configs".to_string(),
        }
    }
}

/// Settings for the chapter enrichment worker
#[derive(Debug, Clone, Serialize)]
pub struct EnrichSettings {
    /// Maximum concurrent probe processes
    pub concurrency: usize,
    pub probe_binary: String,
    pub probe_timeout_seconds: u64,
    /// Finished jobs kept for status lookups
    pub job_history: usize,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            concurrency: 50,
            probe_binary: "ffprobe".to_string(),
            probe_timeout_seconds: 30,
            job_history: DEFAULT_JOB_HISTORY,
        }
    }
}

impl EnrichSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Root of the scanned media tree
    pub media_root: PathBuf,
    /// Base URL the media root is served from
    pub base_url: String,
    /// SQLite database file
    pub database: PathBuf,
    /// Podcatcher YAML export, if any
    pub podcast_file: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub scan: ScanSettings,
    pub tables: TableNames,
    pub enrichment: EnrichSettings,
    pub bookmark_policy: BookmarkPolicy,
}

impl ResolvedConfig {
    /// Configuration rooted at `home` with every other setting defaulted
    pub fn with_home(home: impl Into<PathBuf>, media_root: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            database: home.join("library.db"),
            home,
            media_root: media_root.into(),
            base_url: "/".to_string(),
            podcast_file: None,
            config_file: None,
            scan: ScanSettings::default(),
            tables: TableNames::default(),
            enrichment: EnrichSettings::default(),
            bookmark_policy: BookmarkPolicy::default(),
        }
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

/// Load configuration from all sources, discovering the file from the
/// current directory
pub fn load() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_from(&cwd)
}

/// Load configuration, discovering the file from `start`
pub fn load_from(start: &Path) -> Result<ResolvedConfig> {
    let user_home = dirs::home_dir().context("Failed to determine home directory")?;
    let default_home = user_home.join(CONFIG_DIR);

    let config_file = find_config_file(start);
    let file = config_file.as_deref().map(load_config_file).transpose()?;

    // Project root is the parent of .audioshelf/
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(start)
        .to_path_buf();

    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();

    let home = env_path("AUDIOSHELF_HOME")
        .or_else(|| paths.home.as_deref().map(|p| resolve_path(&base_dir, p)))
        .unwrap_or(default_home);

    let media_root = env_path("AUDIOSHELF_MEDIA_ROOT")
        .or_else(|| paths.media_root.as_deref().map(|p| resolve_path(&base_dir, p)))
        .unwrap_or(user_home);

    let mut config = ResolvedConfig::with_home(home, media_root);
    config.config_file = config_file;

    if let Some(database) = paths.database.as_deref() {
        config.database = resolve_path(&base_dir, database);
    }

    config.podcast_file = env_path("AUDIOSHELF_PODCAST_FILE").or_else(|| {
        paths
            .podcast_file
            .as_deref()
            .map(|p| resolve_path(&base_dir, p))
    });

    if let Some(file) = file {
        apply_file_settings(&mut config, file);
    }

    if let Ok(base_url) = std::env::var("AUDIOSHELF_BASE_URL") {
        config.base_url = base_url;
    }

    Ok(config)
}

/// Overlay the non-path sections of a config file onto defaults
fn apply_file_settings(config: &mut ResolvedConfig, file: ConfigFile) {
    if let Some(base_url) = file.server.and_then(|s| s.base_url) {
        config.base_url = base_url;
    }

    if let Some(scan) = file.scan {
        if let Some(marker) = scan.marker_file {
            config.scan.marker_file = marker;
        }
        if let Some(extensions) = scan.extensions {
            config.scan.extensions = extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect();
        }
    }

    if let Some(tables) = file.tables {
        let names = &mut config.tables;
        names.directories = tables.directories.unwrap_or(names.directories.clone());
        names.lists = tables.lists.unwrap_or(names.lists.clone());
        names.bookmarks = tables.bookmarks.unwrap_or(names.bookmarks.clone());
        names.configs = tables.configs.unwrap_or(names.configs.clone());
    }

    if let Some(enrichment) = file.enrichment {
        let settings = &mut config.enrichment;
        settings.concurrency = enrichment.concurrency.unwrap_or(settings.concurrency).max(1);
        if let Some(binary) = enrichment.probe_binary {
            settings.probe_binary = binary;
        }
        settings.probe_timeout_seconds = enrichment
            .probe_timeout_seconds
            .unwrap_or(settings.probe_timeout_seconds);
        settings.job_history = enrichment.job_history.unwrap_or(settings.job_history);
    }

    if let Some(policy) = file.bookmarks.and_then(|b| b.policy) {
        config.bookmark_policy = policy;
    }
}
