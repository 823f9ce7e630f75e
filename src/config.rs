//! Configuration
//!
//! Layered configuration: serde defaults, then an optional TOML file, then
//! WAYMARK__* environment overrides (highest precedence). Every field has a
//! default so an empty config is a working config.

use crate::error::BrowseError;
use crate::history::{
    CookieFileStore, DEFAULT_COOKIE_NAME, DEFAULT_EXPIRE_DAYS, DEFAULT_MAX_ENTRIES,
};
use crate::loader::DEFAULT_PREFETCH_STAGGER_MS;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where catalog content comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Reference of the root content document.
    #[serde(default = "default_content_file")]
    pub file: String,

    /// Directory that content references resolve against.
    #[serde(default = "default_asset_root")]
    pub asset_root: PathBuf,

    /// Subdirectory of the asset root holding description documents.
    #[serde(default = "default_doc_base")]
    pub doc_base: String,

    /// Fetch content over HTTP from this base URL instead of the filesystem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_content_file() -> String {
    "content.json".to_string()
}

fn default_asset_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_doc_base() -> String {
    "docs".to_string()
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            file: default_content_file(),
            asset_root: default_asset_root(),
            doc_base: default_doc_base(),
            base_url: None,
        }
    }
}

/// Visit history retention and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Name of the persisted cookie entry.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Most entries the log will keep.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Days until the persisted payload expires.
    #[serde(default = "default_expire_days")]
    pub expire_days: i64,

    /// History file path; None means the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_expire_days() -> i64 {
    DEFAULT_EXPIRE_DAYS
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_entries: default_max_entries(),
            expire_days: default_expire_days(),
            file: None,
        }
    }
}

impl HistoryConfig {
    /// Build the persistent store this configuration describes.
    pub fn store(&self) -> CookieFileStore {
        let path = self
            .file
            .clone()
            .unwrap_or_else(CookieFileStore::default_path);
        CookieFileStore::new(path)
            .with_name(self.cookie_name.clone())
            .with_expire_days(self.expire_days)
    }
}

/// Background prefetch of referenced sub-tree documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Whether prefetch runs at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay between successive prefetch launches, in milliseconds.
    #[serde(default = "default_stagger_ms")]
    pub stagger_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_stagger_ms() -> u64 {
    DEFAULT_PREFETCH_STAGGER_MS
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            stagger_ms: default_stagger_ms(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaymarkConfig {
    #[serde(default)]
    pub content: ContentConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub prefetch: PrefetchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WaymarkConfig {
    /// Load configuration.
    ///
    /// Precedence, lowest to highest: serde defaults, the given TOML file
    /// (or `waymark.toml` in the working directory when no path is given),
    /// WAYMARK__* environment variables. Nested keys use `__` as separator,
    /// for example `WAYMARK__PREFETCH__STAGGER_MS=250`.
    pub fn load(path: Option<&Path>) -> Result<Self, BrowseError> {
        let builder = Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name("waymark").required(false)),
        };
        let settings = builder
            .add_source(
                Environment::with_prefix("WAYMARK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| BrowseError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| BrowseError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Default configuration rendered as TOML, for `waymark init`.
    pub fn default_toml() -> Result<String, BrowseError> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| BrowseError::ConfigError(format!("Failed to render configuration: {}", e)))
    }
}
