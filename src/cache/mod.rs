//! Django-compatible cache backend over an expiring key-value store.
//!
//! [`CompatCache`] translates the framework cache contract (timeouts with a
//! "use default" sentinel, versioned keys, add-if-absent) onto any [`Store`].
//! Two stores ship with the crate:
//! - [`FanoutStore`] (persistent, sharded across several disk caches)
//! - [`MemoryStore`] (in-process, mostly for tests)
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! store = "fanout"        # or "memory"
//! directory = "cache"
//! shards = 8
//! database_timeout = 0.025
//! timeout = 300           # or "never"
//! version = 1
//! key_prefix = ""
//!
//! [cache.options]
//! sync_to_disk = "false"
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let cache = open_cache(&settings.cache)?;
//! cache.set("greeting", b"hello".to_vec(), SetOptions::default()).await?;
//! let value = cache.get_value("greeting", None).await?;
//! cache.close().await?;
//! ```

mod adapter;
mod error;
mod fanout;
mod key;
mod manager;
mod memory;
mod timeout;
mod traits;

#[cfg(test)]
mod tests;

pub use adapter::CompatCache;
pub use error::CacheError;
pub use fanout::{FanoutStore, StoreOptions};
pub use key::{KeyBuilder, KeyFunc, KeyWarning, MAX_KEY_LENGTH, validate_key};
pub use manager::{open_cache, open_store};
pub use memory::MemoryStore;
pub use timeout::{Expiration, Timeout};
pub use traits::{
    CacheBackend, Fetched, FetchedValue, GetOptions, SetOptions, Store, StoredValue,
};
