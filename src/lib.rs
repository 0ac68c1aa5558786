//! diskcache-compat library
//!
//! A Django-compatible cache backend over an expiring, sharded disk store,
//! plus the configuration, logging and command-line layers around it.

use shadow_rs::shadow;
shadow!(build);

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;

pub use cache::{CacheBackend, CompatCache, open_cache};

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
