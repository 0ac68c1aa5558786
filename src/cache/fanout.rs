//! Sharded disk store with per-entry expiration and tags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use cached::IOCached;
use cached::stores::DiskCache as CachedDiskCache;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use xxhash_rust::xxh3::xxh3_64;

use crate::cache::{CacheError, Expiration, Store, StoredValue};

type ShardCache = CachedDiskCache<String, Vec<u8>>;

/// Options understood by [`FanoutStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Flush each shard to disk after every change.
    pub sync_to_disk: bool,
    /// Prefix of the per-shard database names.
    pub name_prefix: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sync_to_disk: false,
            name_prefix: "shard".to_string(),
        }
    }
}

impl StoreOptions {
    /// Read options from a free-form map. Unknown keys are logged and ignored.
    pub fn from_map(options: &BTreeMap<String, String>) -> Result<Self, CacheError> {
        let mut parsed = Self::default();
        for (name, value) in options {
            match name.as_str() {
                "sync_to_disk" => {
                    parsed.sync_to_disk = value.trim().parse().map_err(|_| {
                        CacheError::InvalidConfig(format!(
                            "option sync_to_disk expects true or false, got '{}'",
                            value
                        ))
                    })?;
                }
                "name_prefix" => {
                    if value.is_empty() {
                        return Err(CacheError::InvalidConfig(
                            "option name_prefix cannot be empty".to_string(),
                        ));
                    }
                    parsed.name_prefix = value.clone();
                }
                _ => tracing::warn!(option = %name, "ignoring unknown store option"),
            }
        }
        Ok(parsed)
    }
}

/// Disk-backed store spread over independent shards.
///
/// Each shard is its own on-disk database behind a read-write lock. Entry
/// operations share the read side; `clear` and `close` take the write side.
/// Waiting for a lock is bounded by the configured timeout: a timed-out
/// `get` is a miss and a timed-out `set` or `delete` reports `false`.
///
/// `close` drops every shard database, releasing the directory.
pub struct FanoutStore {
    directory: PathBuf,
    shards: Vec<RwLock<Option<ShardCache>>>,
    lock_timeout: Duration,
    closed: AtomicBool,
}

impl FanoutStore {
    pub fn open(
        directory: impl AsRef<Path>,
        shards: usize,
        lock_timeout: Duration,
        options: &BTreeMap<String, String>,
    ) -> Result<Self, CacheError> {
        if shards == 0 {
            return Err(CacheError::InvalidConfig(
                "shard count must be at least 1".to_string(),
            ));
        }
        let options = StoreOptions::from_map(options)?;
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory).map_err(|e| {
            CacheError::Connection(format!("{}: {}", directory.display(), e))
        })?;

        let shards = (0..shards)
            .map(|index| {
                CachedDiskCache::new(&format!("{}{:03}", options.name_prefix, index))
                    .set_disk_directory(&directory)
                    .set_sync_to_disk_on_cache_change(options.sync_to_disk)
                    .build()
                    .map(|shard| RwLock::new(Some(shard)))
                    .map_err(|e| CacheError::Connection(e.to_string()))
            })
            .collect::<Result<Vec<RwLock<Option<ShardCache>>>, _>>()?;

        tracing::debug!(
            directory = %directory.display(),
            shards = shards.len(),
            ?lock_timeout,
            "opened fanout store"
        );

        Ok(Self {
            directory,
            shards,
            lock_timeout,
            closed: AtomicBool::new(false),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Index of the shard holding `key`. Stable across processes.
    pub fn shard_index(&self, key: &str) -> usize {
        (xxh3_64(key.as_bytes()) % self.shards.len() as u64) as usize
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(())
    }

    async fn read_shard(
        &self,
        index: usize,
    ) -> Result<RwLockReadGuard<'_, Option<ShardCache>>, CacheError> {
        tokio::time::timeout(self.lock_timeout, self.shards[index].read())
            .await
            .map_err(|_| CacheError::Timeout { shard: index })
    }

    async fn write_shard(&self, index: usize) -> RwLockWriteGuard<'_, Option<ShardCache>> {
        // Unbounded: clear and close always cover every shard.
        self.shards[index].write().await
    }

    fn opened(shard: &Option<ShardCache>) -> Result<&ShardCache, CacheError> {
        shard.as_ref().ok_or(CacheError::Closed)
    }

    fn read_entry(
        store: &ShardCache,
        key: &String,
    ) -> Result<Option<StoredValue>, CacheError> {
        let bytes = store
            .cache_get(key)
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let entry = serde_json::from_slice::<StoredValue>(&bytes)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        if entry.expire.is_expired() {
            store
                .cache_remove(key)
                .map_err(|e| CacheError::Operation(e.to_string()))?;
            return Ok(None);
        }
        Ok(Some(entry))
    }
}

#[async_trait]
impl Store for FanoutStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError> {
        self.ensure_open()?;
        let index = self.shard_index(key);
        let guard = match self.read_shard(index).await {
            Ok(guard) => guard,
            Err(CacheError::Timeout { shard }) => {
                tracing::warn!(shard, key, "lock timeout on get, treating as miss");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        Self::read_entry(Self::opened(&guard)?, &key.to_string())
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
        tag: Option<String>,
    ) -> Result<bool, CacheError> {
        self.ensure_open()?;
        let entry = StoredValue { value, expire, tag };
        let bytes =
            serde_json::to_vec(&entry).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let index = self.shard_index(key);
        let guard = match self.read_shard(index).await {
            Ok(guard) => guard,
            Err(CacheError::Timeout { shard }) => {
                tracing::warn!(shard, key, "lock timeout on set, write skipped");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        Self::opened(&guard)?
            .cache_set(key.to_string(), bytes)
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.ensure_open()?;
        let index = self.shard_index(key);
        let guard = match self.read_shard(index).await {
            Ok(guard) => guard,
            Err(CacheError::Timeout { shard }) => {
                tracing::warn!(shard, key, "lock timeout on delete, nothing removed");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        let removed = Self::opened(&guard)?
            .cache_remove(&key.to_string())
            .map_err(|e| CacheError::Operation(e.to_string()))?;
        Ok(removed.is_some())
    }

    async fn contains(&self, key: &str) -> Result<bool, CacheError> {
        self.ensure_open()?;
        let guard = self.read_shard(self.shard_index(key)).await?;
        Ok(Self::read_entry(Self::opened(&guard)?, &key.to_string())?.is_some())
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        self.ensure_open()?;
        let mut removed = 0;
        for index in 0..self.shards.len() {
            let guard = self.write_shard(index).await;
            let db = Self::opened(&guard)?.connection();
            removed += db.len();
            db.clear()
                .map_err(|e| CacheError::Operation(e.to_string()))?;
            db.flush()
                .map_err(|e| CacheError::Operation(e.to_string()))?;
        }
        Ok(removed)
    }

    async fn close(&self) -> Result<(), CacheError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut first_error = None;
        for index in 0..self.shards.len() {
            let Some(store) = self.write_shard(index).await.take() else {
                continue;
            };
            if let Err(e) = store.connection().flush()
                && first_error.is_none()
            {
                first_error = Some(CacheError::Operation(e.to_string()));
            }
            // Dropping the database releases its lock on the directory.
            drop(store);
        }
        tracing::debug!(directory = %self.directory.display(), "closed fanout store");
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn open_store(shards: usize) -> (TempDir, FanoutStore) {
        let dir = tempdir().unwrap();
        let store = FanoutStore::open(
            dir.path(),
            shards,
            Duration::from_millis(25),
            &BTreeMap::new(),
        )
        .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_get_set() {
        let (_dir, store) = open_store(4);
        assert!(store
            .set("key", b"value".to_vec(), Expiration::Never, Some("tag".into()))
            .await
            .unwrap());
        let entry = store.get("key").await.unwrap().unwrap();
        assert_eq!(entry.value, b"value".to_vec());
        assert_eq!(entry.tag.as_deref(), Some("tag"));
        assert!(store.contains("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, store) = open_store(4);
        store.set("key", b"value".to_vec(), Expiration::Never, None).await.unwrap();
        assert!(store.delete("key").await.unwrap());
        assert!(!store.delete("key").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let (_dir, store) = open_store(2);
        store.set("key", b"value".to_vec(), Expiration::EXPIRED, None).await.unwrap();
        assert_eq!(store.get("key").await.unwrap(), None);
        assert!(!store.contains("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let (_dir, store) = open_store(2);
        let expire = crate::cache::Timeout::Seconds(1).translate(None);
        store.set("key", b"value".to_vec(), expire, None).await.unwrap();
        assert!(store.get("key").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(store.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_all_shards() {
        let (_dir, store) = open_store(8);
        for i in 0..32 {
            store
                .set(&format!("k{i}"), vec![i as u8], Expiration::Never, None)
                .await
                .unwrap();
        }
        assert_eq!(store.clear().await.unwrap(), 32);
        for i in 0..32 {
            assert!(!store.contains(&format!("k{i}")).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_shard_index_is_stable() {
        let (_dir, store) = open_store(8);
        let index = store.shard_index("some-key");
        assert!(index < 8);
        assert_eq!(index, store.shard_index("some-key"));
    }

    #[tokio::test]
    async fn test_lock_timeout() {
        let (_dir, store) = open_store(1);
        let _held = store.shards[0].write().await;
        assert!(!store.set("key", b"v".to_vec(), Expiration::Never, None).await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), None);
        assert!(!store.delete("key").await.unwrap());
        assert!(matches!(
            store.contains("key").await,
            Err(CacheError::Timeout { shard: 0 })
        ));
    }

    #[tokio::test]
    async fn test_readers_share_a_shard() {
        let (_dir, store) = open_store(1);
        let _reader = store.shards[0].read().await;
        assert!(store.set("key", b"v".to_vec(), Expiration::Never, None).await.unwrap());
        assert!(store.contains("key").await.unwrap());
        assert!(store.get("key").await.unwrap().is_some());
        assert!(store.delete("key").await.unwrap());
    }

    #[tokio::test]
    async fn test_close_releases_directory() {
        let (dir, first) = open_store(2);
        first.set("key", b"value".to_vec(), Expiration::Never, None).await.unwrap();
        first.close().await.unwrap();
        assert!(first.shards.iter().all(|shard| shard.try_read().is_ok_and(|s| s.is_none())));

        // the first handle is still alive here
        let second = FanoutStore::open(
            first.directory(),
            first.shard_count(),
            first.lock_timeout(),
            &BTreeMap::new(),
        )
        .unwrap();
        assert_eq!(second.directory(), dir.path());
        let entry = second.get("key").await.unwrap().unwrap();
        assert_eq!(entry.value, b"value".to_vec());
        assert!(matches!(first.contains("key").await, Err(CacheError::Closed)));
        second.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (_dir, store) = open_store(2);
        store.close().await.unwrap();
        store.close().await.unwrap();
        assert!(matches!(store.get("key").await, Err(CacheError::Closed)));
        assert!(matches!(store.clear().await, Err(CacheError::Closed)));
    }

    #[test]
    fn test_store_options() {
        let mut map = BTreeMap::new();
        map.insert("sync_to_disk".to_string(), "true".to_string());
        map.insert("unknown".to_string(), "x".to_string());
        let options = StoreOptions::from_map(&map).unwrap();
        assert!(options.sync_to_disk);
        assert_eq!(options.name_prefix, "shard");

        map.insert("sync_to_disk".to_string(), "maybe".to_string());
        assert!(StoreOptions::from_map(&map).is_err());
    }

    #[test]
    fn test_zero_shards_rejected() {
        let dir = tempdir().unwrap();
        let result = FanoutStore::open(dir.path(), 0, Duration::from_millis(25), &BTreeMap::new());
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }
}
