//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// Misses are never errors: an absent or expired key is reported through the
/// normal return values of the cache contract.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timed out waiting for shard {shard} lock")]
    Timeout { shard: usize },

    #[error("Cache is closed")]
    Closed,
}
