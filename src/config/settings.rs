//! Configuration settings structures for diskcache-compat
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "diskcache-compat".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/diskcache.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_cache_directory() -> String {
    "cache".to_string()
}

fn default_shards() -> usize {
    8
}

fn default_database_timeout() -> f64 {
    0.025
}

fn default_cache_timeout() -> TimeoutSetting {
    TimeoutSetting::Seconds(300)
}

fn default_cache_version() -> u64 {
    1
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Logger Configuration
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = self.console.into_console_config();
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl ConsoleSettings {
    /// Convert ConsoleSettings to ConsoleConfig
    pub fn into_console_config(self) -> ConsoleConfig {
        ConsoleConfig::new(self.enabled, self.colored)
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self.parse_format()?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format).map_err(
            |e| ConfigError::ValidationError {
                field: "logger.file".to_string(),
                message: e.to_string(),
            },
        )
    }

    /// Parse the format string into LogFormat enum
    pub(crate) fn parse_format(&self) -> Result<LogFormat, ConfigError> {
        self.format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })
    }
}

// ============================================================================
// Cache Configuration
// ============================================================================

/// Store behind the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Sharded on-disk store
    #[default]
    Fanout,
    /// In-process store, lost on exit
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Fanout => "fanout",
            StoreKind::Memory => "memory",
        }
    }
}

/// Default timeout as written in configuration: seconds, or `"never"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSetting {
    Seconds(u64),
    Keyword(String),
}

impl TimeoutSetting {
    /// Resolve to seconds, with `None` meaning entries never expire.
    pub fn resolve(&self) -> Result<Option<u64>, ConfigError> {
        match self {
            TimeoutSetting::Seconds(secs) => Ok(Some(*secs)),
            TimeoutSetting::Keyword(keyword) => match keyword.trim().to_lowercase().as_str() {
                "never" | "none" => Ok(None),
                other => other.parse::<u64>().map(Some).map_err(|_| {
                    ConfigError::validation(
                        "cache.timeout".to_string(),
                        format!(
                            "Invalid timeout '{}'. Use a number of seconds or \"never\".",
                            keyword
                        ),
                    )
                }),
            },
        }
    }
}

impl std::fmt::Display for TimeoutSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutSetting::Seconds(secs) => write!(f, "{secs}s"),
            TimeoutSetting::Keyword(keyword) => f.write_str(keyword),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Store backing the cache
    #[serde(default)]
    pub store: StoreKind,

    /// Directory holding the shard databases
    #[serde(default = "default_cache_directory")]
    pub directory: String,

    /// Number of shards
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Seconds to wait for a shard lock
    #[serde(default = "default_database_timeout")]
    pub database_timeout: f64,

    /// Default entry timeout
    #[serde(default = "default_cache_timeout")]
    pub timeout: TimeoutSetting,

    /// Default key version
    #[serde(default = "default_cache_version")]
    pub version: u64,

    /// Prefix of every key
    #[serde(default)]
    pub key_prefix: String,

    /// Extra options passed to the store as-is
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            directory: default_cache_directory(),
            shards: default_shards(),
            database_timeout: default_database_timeout(),
            timeout: default_cache_timeout(),
            version: default_cache_version(),
            key_prefix: String::new(),
            options: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Shard lock acquisition timeout
    pub fn lock_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.database_timeout)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_database_timeout()))
    }

    /// Default entry timeout in seconds, `None` for never
    pub fn default_timeout(&self) -> Result<Option<u64>, ConfigError> {
        self.timeout.resolve()
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// This structure represents the entire configuration that can be loaded
/// from TOML files and environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
}
