//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{CacheConfig, FileSettings, LoggerSettings, Settings, StoreKind};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Upper bound on the shard count
pub const MAX_SHARDS: usize = 256;

impl CacheConfig {
    /// Validate cache configuration
    ///
    /// # Validation Rules
    /// - Shard count must be between 1 and `MAX_SHARDS`
    /// - Database timeout must be a positive, finite number of seconds
    /// - Timeout must be a number of seconds or "never"
    /// - Directory must not be empty for the fanout store
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shards == 0 || self.shards > MAX_SHARDS {
            return Err(ConfigError::validation(
                "cache.shards".to_string(),
                format!("Shard count must be between 1 and {}.", MAX_SHARDS),
            ));
        }

        if !self.database_timeout.is_finite() || self.database_timeout <= 0.0 {
            return Err(ConfigError::validation(
                "cache.database_timeout",
                "Database timeout must be a positive number of seconds.",
            ));
        }

        self.timeout.resolve()?;

        if self.store == StoreKind::Fanout && self.directory.trim().is_empty() {
            return Err(ConfigError::validation(
                "cache.directory",
                "Cache directory is required for the fanout store.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger configuration
    ///
    /// # Validation Rules
    /// - Level must be one of: trace, debug, info, warn, error
    /// - At least one output must be enabled
    /// - File settings must be valid when file output is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::validation(
                "logger.level".to_string(),
                format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        if self.file.enabled {
            self.file.validate()?;
        }

        Ok(())
    }
}

impl FileSettings {
    /// Validate file output configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "Log file path cannot be empty when file output is enabled.",
            ));
        }

        let format = self.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::validation(
                "logger.file.format".to_string(),
                format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate the complete settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logger.validate()?;
        self.cache.validate()?;
        Ok(())
    }
}
