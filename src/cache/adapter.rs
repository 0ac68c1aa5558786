//! Framework-compatible cache backed by a single [`Store`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{
    CacheBackend, CacheError, Expiration, Fetched, FetchedValue, GetOptions, KeyBuilder,
    SetOptions, Store, Timeout,
};

/// Exposes a [`Store`] through the [`CacheBackend`] contract.
///
/// Every operation builds the fully-qualified key, resolves the timeout and
/// makes the matching store call. Store errors are returned unchanged.
#[derive(Clone)]
pub struct CompatCache {
    store: Arc<dyn Store>,
    keys: KeyBuilder,
    default_timeout: Option<u64>,
}

impl CompatCache {
    /// Create a cache over `store`.
    ///
    /// `default_timeout` is used for [`Timeout::UseDefault`]: `None` never
    /// expires, `Some(0)` expires immediately.
    pub fn new(store: Arc<dyn Store>, keys: KeyBuilder, default_timeout: Option<u64>) -> Self {
        Self {
            store,
            keys,
            default_timeout,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }

    pub fn default_timeout(&self) -> Option<u64> {
        self.default_timeout
    }

    /// The key used in the store for `key` at `version`.
    pub fn make_key(&self, key: &str, version: Option<u64>) -> String {
        self.keys.make_and_validate_key(key, version)
    }

    /// The store expiration for `timeout`, resolved against the default.
    pub fn backend_expiration(&self, timeout: Timeout) -> Expiration {
        timeout.translate(self.default_timeout)
    }
}

impl std::fmt::Debug for CompatCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatCache")
            .field("keys", &self.keys)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheBackend for CompatCache {
    /// Not atomic: the presence check and the write are separate store calls,
    /// so two concurrent `add`s of one key may both store, the last one
    /// winning. Atomic insert-if-absent needs a store-side primitive.
    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        options: SetOptions,
    ) -> Result<bool, CacheError> {
        if self.has_key(key, options.version).await? {
            tracing::debug!(key, "add skipped, key exists");
            return Ok(false);
        }
        self.set(key, value, options).await
    }

    async fn get(
        &self,
        key: &str,
        default: Option<Vec<u8>>,
        options: GetOptions,
    ) -> Result<Option<Fetched>, CacheError> {
        let full_key = self.make_key(key, options.version);
        match self.store.get(&full_key).await? {
            Some(entry) => Ok(Some(Fetched {
                value: FetchedValue::from_stored(entry.value, options.read),
                expire_time: options.expire_time.then_some(entry.expire),
                tag: if options.tag { entry.tag } else { None },
            })),
            None => {
                tracing::debug!(key = %full_key, "cache miss");
                Ok(default.map(|value| Fetched {
                    value: FetchedValue::Bytes(value),
                    expire_time: None,
                    tag: None,
                }))
            }
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        options: SetOptions,
    ) -> Result<bool, CacheError> {
        let full_key = self.make_key(key, options.version);
        let expire = self.backend_expiration(options.timeout);
        self.store.set(&full_key, value, expire, options.tag).await
    }

    async fn delete(&self, key: &str, version: Option<u64>) -> Result<(), CacheError> {
        let full_key = self.make_key(key, version);
        let removed = self.store.delete(&full_key).await?;
        tracing::debug!(key = %full_key, removed, "cache delete");
        Ok(())
    }

    async fn has_key(&self, key: &str, version: Option<u64>) -> Result<bool, CacheError> {
        let full_key = self.make_key(key, version);
        self.store.contains(&full_key).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let removed = self.store.clear().await?;
        tracing::debug!(removed, "cache cleared");
        Ok(())
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.store.close().await
    }
}
