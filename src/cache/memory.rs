//! In-process store with per-entry expiration.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::{CacheError, Expiration, Store, StoredValue};

/// Store that keeps entries in a concurrent map.
///
/// Expired entries are dropped when they are next looked at.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(())
    }

    fn live_entry(&self, key: &str) -> Option<StoredValue> {
        let entry = self.entries.get(key)?.value().clone();
        if entry.expire.is_expired() {
            self.entries
                .remove_if(key, |_, stored| stored.expire.is_expired());
            return None;
        }
        Some(entry)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError> {
        self.ensure_open()?;
        Ok(self.live_entry(key))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
        tag: Option<String>,
    ) -> Result<bool, CacheError> {
        self.ensure_open()?;
        self.entries
            .insert(key.to_string(), StoredValue { value, expire, tag });
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.ensure_open()?;
        Ok(self.entries.remove(key).is_some())
    }

    async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        self.ensure_open()?;
        Ok(self.live_entry(key).is_some())
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        self.ensure_open()?;
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }

    async fn close(&self) -> Result<(), CacheError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set() {
        let store = MemoryStore::new();
        store
            .set("key", b"value".to_vec(), Expiration::Never, None)
            .await
            .unwrap();
        let entry = store.get("key").await.unwrap().unwrap();
        assert_eq!(entry.value, b"value".to_vec());
        assert_eq!(entry.expire, Expiration::Never);
    }

    #[tokio::test]
    async fn test_expired_entry_is_purged() {
        let store = MemoryStore::new();
        store
            .set("key", b"value".to_vec(), Expiration::EXPIRED, None)
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.contains("key").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clear_counts_entries() {
        let store = MemoryStore::new();
        store.set("k1", b"v1".to_vec(), Expiration::Never, None).await.unwrap();
        store.set("k2", b"v2".to_vec(), Expiration::Never, None).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.get("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_operations() {
        let store = MemoryStore::new();
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(matches!(store.get("key").await, Err(CacheError::Closed)));
        assert!(matches!(
            store.set("key", Vec::new(), Expiration::Never, None).await,
            Err(CacheError::Closed)
        ));
    }
}
