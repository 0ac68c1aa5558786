//! Check command handler
//!
//! Validates the merged configuration and prints the resolved cache settings
//! without opening the store.

use std::io::Write;

use crate::config::settings::{Settings, StoreKind};
use crate::error::{AppError, AppResult};

/// Handler for the check command
pub struct CheckCommandHandler {
    config: Settings,
}

impl CheckCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }

    /// Validate the configuration and describe the cache it would open
    ///
    /// # Errors
    /// - Configuration validation errors
    pub fn execute(&self, out: &mut dyn Write) -> AppResult<()> {
        self.config.validate()?;
        let cache = &self.config.cache;
        let default_timeout = match cache.default_timeout()? {
            Some(secs) => format!("{}s", secs),
            None => "never".to_string(),
        };

        let mut lines = vec![
            "✓ Configuration is valid".to_string(),
            format!("✓ Store: {}", cache.store.as_str()),
        ];
        if cache.store == StoreKind::Fanout {
            lines.push(format!(
                "✓ Directory: {} ({} shards, {}s lock timeout)",
                cache.directory, cache.shards, cache.database_timeout
            ));
        }
        lines.push(format!("✓ Default timeout: {}", default_timeout));
        lines.push(format!(
            "✓ Keys: prefix '{}', version {}",
            cache.key_prefix, cache.version
        ));
        lines.push(format!("✓ Logger level: {}", self.config.logger.level));

        for line in lines {
            writeln!(out, "{}", line).map_err(|e| AppError::from(anyhow::Error::from(e)))?;
        }
        Ok(())
    }
}
