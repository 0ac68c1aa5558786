//! Builds a [`CompatCache`] from configuration.

use std::path::Path;
use std::sync::Arc;

use crate::cache::{CacheError, CompatCache, FanoutStore, KeyBuilder, MemoryStore, Store};
use crate::config::settings::{CacheConfig, StoreKind};

/// Open the configured store and wrap it in a [`CompatCache`].
///
/// The default timeout is resolved once here and kept on the cache.
pub fn open_cache(config: &CacheConfig) -> Result<CompatCache, CacheError> {
    let default_timeout = config
        .default_timeout()
        .map_err(|e| CacheError::InvalidConfig(e.to_string()))?;
    let store = open_store(config)?;
    let keys = KeyBuilder::new(config.key_prefix.clone(), config.version);

    tracing::info!(
        store = config.store.as_str(),
        default_timeout = ?default_timeout,
        key_prefix = %config.key_prefix,
        version = config.version,
        "cache ready"
    );

    Ok(CompatCache::new(store, keys, default_timeout))
}

/// Open the store selected by `config.store`.
pub fn open_store(config: &CacheConfig) -> Result<Arc<dyn Store>, CacheError> {
    let store: Arc<dyn Store> = match config.store {
        StoreKind::Fanout => Arc::new(FanoutStore::open(
            Path::new(&config.directory),
            config.shards,
            config.lock_timeout(),
            &config.options,
        )?),
        StoreKind::Memory => {
            if !config.options.is_empty() {
                tracing::warn!("memory store ignores cache.options");
            }
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
