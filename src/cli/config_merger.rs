//! Configuration merger for CLI arguments and config files
//!
//! This module handles merging CLI argument overrides with file-based configuration,
//! implementing the configuration precedence logic.

use super::parser::Cli;
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI overrides on top of file-based configuration
///
/// CLI arguments have the highest priority, above environment variables.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Load the base configuration selected by `--config` and `--env`
    ///
    /// # Errors
    /// Returns ConfigError if configuration loading or validation fails
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(ref path) = cli.config {
            loader = loader.with_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }

        Ok(Self::new(loader.load()?))
    }

    /// Merge CLI arguments with the base configuration and validate the result
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(ref directory) = cli.directory {
            config.cache.directory = directory.to_string_lossy().into_owned();
        }

        config.validate()?;

        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_configuration_merger_new() {
        let base_config = Settings::default();
        let merger = ConfigurationMerger::new(base_config.clone());
        assert_eq!(merger.config(), &base_config);
    }

    #[test]
    fn test_merge_verbose_flag() {
        let merger = ConfigurationMerger::new(Settings::default());

        let cli = Cli::try_parse_from(["diskcache-compat", "--verbose", "check"]).unwrap();
        let merged = merger.merge_cli_args(&cli).unwrap();

        assert_eq!(merged.logger.level, "debug");
    }

    #[test]
    fn test_merge_quiet_flag() {
        let merger = ConfigurationMerger::new(Settings::default());

        let cli = Cli::try_parse_from(["diskcache-compat", "--quiet", "check"]).unwrap();
        let merged = merger.merge_cli_args(&cli).unwrap();

        assert_eq!(merged.logger.level, "error");
    }

    #[test]
    fn test_merge_directory_override() {
        let merger = ConfigurationMerger::new(Settings::default());

        let cli =
            Cli::try_parse_from(["diskcache-compat", "--directory", "/tmp/other", "clear"])
                .unwrap();
        let merged = merger.merge_cli_args(&cli).unwrap();

        assert_eq!(merged.cache.directory, "/tmp/other");
        // untouched settings survive the merge
        assert_eq!(merged.cache.shards, Settings::default().cache.shards);
    }

    #[test]
    fn test_merge_rejects_invalid_base() {
        let mut base = Settings::default();
        base.cache.shards = 0;
        let merger = ConfigurationMerger::new(base);

        let cli = Cli::try_parse_from(["diskcache-compat", "check"]).unwrap();
        assert!(merger.merge_cli_args(&cli).is_err());
    }
}
