//! CLI argument validation functions
//!
//! This module provides custom validation functions for CLI arguments
//! that go beyond what clap can validate automatically.

use std::fs;
use std::path::PathBuf;

use crate::cache::Timeout;

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{}'", path_str));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{}'", path_str));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!(
            "Cannot read configuration file '{}': {}",
            path_str, e
        )),
    }
}

/// Validate a cache directory: may be missing, must not be a regular file
pub fn validate_cache_directory(path_str: &str) -> Result<PathBuf, String> {
    if path_str.trim().is_empty() {
        return Err("Cache directory cannot be empty".to_string());
    }

    let path = PathBuf::from(path_str);
    if path.exists() && !path.is_dir() {
        return Err(format!("Cache directory is not a directory: '{}'", path_str));
    }

    Ok(path)
}

/// Parse a timeout: seconds, `0`, `never` or `default`
pub fn parse_timeout(timeout_str: &str) -> Result<Timeout, String> {
    timeout_str.parse::<Timeout>()
}

/// Reject empty keys; other key problems are only warned about
pub fn validate_key_argument(key_str: &str) -> Result<String, String> {
    if key_str.is_empty() {
        return Err("Key cannot be empty".to_string());
    }
    Ok(key_str.to_string())
}
