//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cache::Timeout;

/// Django-compatible disk cache
#[derive(Parser, Debug)]
#[command(name = "diskcache-compat")]
#[command(about = "Operate a Django-compatible disk cache from the command line")]
#[command(long_about = "
diskcache-compat exposes a sharded, expiring disk cache through the cache
contract used by web frameworks: versioned keys, default timeouts, and
add-if-absent semantics.

EXAMPLES:
    # Store a value for five minutes
    diskcache-compat set greeting hello --timeout 300

    # Store a value that never expires
    diskcache-compat set motd 'welcome' --timeout never

    # Read it back with its expiration time
    diskcache-compat get greeting --expire-time

    # Add only if the key is absent
    diskcache-compat add lock owner-1

    # Use a custom configuration file and cache directory
    diskcache-compat --config /etc/diskcache/production.toml --directory /tmp/cache clear

    # Validate configuration without touching the cache
    diskcache-compat check
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    ///
    /// Load only this TOML file instead of the layered `config/` directory.
    /// The file must exist and be readable.
    ///
    /// Example: --config /etc/diskcache/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` layer is loaded.
    ///
    /// Available values: development (dev), production (prod), test, staging
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Raises log output to debug level. Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Lowers log output to error level. Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Cache directory override
    ///
    /// Replaces `cache.directory` from the configuration.
    #[arg(short, long, value_name = "DIR", value_parser = super::validation::validate_cache_directory)]
    pub directory: Option<PathBuf>,
}

/// Key and optional version shared by every keyed command
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct KeyArgs {
    /// Cache key, before prefixing and versioning
    #[arg(value_parser = super::validation::validate_key_argument)]
    pub key: String,

    /// Key version, defaults to `cache.version`
    #[arg(long, value_name = "N")]
    pub version: Option<u64>,
}

/// Value and write options shared by `set` and `add`
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct WriteArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Value to store, as UTF-8 text
    pub value: String,

    /// Entry timeout: seconds, 0 (expire immediately), never, or default
    #[arg(long, value_name = "T", default_value = "default", value_parser = super::validation::parse_timeout)]
    pub timeout: Timeout,

    /// Tag stored alongside the entry
    #[arg(long)]
    pub tag: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Fetch a value
    ///
    /// Prints the value, or nothing when the key is missing and no default
    /// was given.
    Get {
        #[command(flatten)]
        key: KeyArgs,

        /// Value printed when the key is missing
        #[arg(long, value_name = "V")]
        default: Option<String>,

        /// Also print the expiration time
        #[arg(long)]
        expire_time: bool,

        /// Also print the tag
        #[arg(long)]
        tag: bool,
    },

    /// Store a value, overwriting any existing entry
    Set(WriteArgs),

    /// Store a value only if the key is absent
    ///
    /// Prints `stored` or `exists`.
    Add(WriteArgs),

    /// Remove a key; missing keys are not an error
    Delete(KeyArgs),

    /// Report whether a live entry exists
    ///
    /// Prints `true` or `false`.
    HasKey(KeyArgs),

    /// Remove every entry in the cache
    Clear,

    /// Validate configuration and exit
    ///
    /// Prints the resolved cache settings without opening the store.
    Check,
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
}

impl Commands {
    /// Short name used in log output
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Get { .. } => "get",
            Commands::Set(_) => "set",
            Commands::Add(_) => "add",
            Commands::Delete(_) => "delete",
            Commands::HasKey(_) => "has-key",
            Commands::Clear => "clear",
            Commands::Check => "check",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
        }
    }
}
