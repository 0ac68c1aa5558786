//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use std::io::Write;

use super::handlers::{CacheCommandHandler, CheckCommandHandler};
use super::parser::{Cli, Commands};
use crate::cache::{CacheBackend, open_cache};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Execute a CLI command with the given settings, writing results to stdout
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute_command_to(cli, settings, &mut out).await
}

/// Execute a CLI command, writing results to `out`
///
/// Every command except `check` opens the configured cache, and the cache is
/// closed again whether or not the command succeeded.
///
/// # Errors
/// Returns errors from command handlers, the cache, or configuration
pub async fn execute_command_to(
    cli: &Cli,
    settings: Settings,
    out: &mut dyn Write,
) -> AppResult<()> {
    tracing::debug!(command = cli.command.name(), "executing command");

    if cli.command == Commands::Check {
        return CheckCommandHandler::new(settings).execute(out);
    }

    let handler = CacheCommandHandler::new(open_cache(&settings.cache)?);
    let result = handler.execute(&cli.command, out).await;
    let closed = handler.cache().close().await;

    if let Err(ref e) = result {
        tracing::error!(command = cli.command.name(), error = %e, "command failed");
    }
    result?;
    closed?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn settings_in(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.cache.directory = dir.to_str().unwrap().to_string();
        settings.cache.shards = 2;
        settings
    }

    async fn run(settings: &Settings, args: &[&str]) -> AppResult<String> {
        let mut argv = vec!["diskcache-compat"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();

        let mut out = Vec::new();
        execute_command_to(&cli, settings.clone(), &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_execute_check() {
        let dir = tempdir().unwrap();
        let output = run(&settings_in(dir.path()), &["check"]).await.unwrap();
        assert!(output.contains("✓ Configuration is valid"));
    }

    #[tokio::test]
    async fn test_execute_opens_configured_directory() {
        let dir = tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let output = run(&settings_in(&cache_dir), &["add", "greeting", "hello"])
            .await
            .unwrap();

        assert_eq!(output, "stored\n");
        assert!(cache_dir.is_dir());
    }

    #[tokio::test]
    async fn test_execute_against_memory_store() {
        let mut settings = Settings::default();
        settings.cache.store = crate::config::settings::StoreKind::Memory;

        assert_eq!(run(&settings, &["has-key", "k"]).await.unwrap(), "false\n");
        assert_eq!(run(&settings, &["get", "k", "--default", "d"]).await.unwrap(), "d\n");
    }

    #[tokio::test]
    async fn test_execute_rejects_invalid_cache_settings() {
        let mut settings = Settings::default();
        settings.cache.store = crate::config::settings::StoreKind::Memory;
        settings.cache.timeout = crate::config::settings::TimeoutSetting::Keyword("later".into());

        assert!(run(&settings, &["clear"]).await.is_err());
    }
}
