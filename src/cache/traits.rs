//! Store and cache-backend trait definitions.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheError, Expiration, Timeout};

/// An entry as held by a [`Store`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: Vec<u8>,
    pub expire: Expiration,
    pub tag: Option<String>,
}

/// Native contract of an expiring key-value store.
///
/// Keys are already fully qualified. Implementations must never return an
/// entry whose expiration has passed, and must fail with
/// [`CacheError::Closed`] once closed.
#[async_trait]
pub trait Store: Send + Sync {
    /// Look up a live entry, returning its value, expiration and tag together.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError>;

    /// Create or overwrite an entry. Returns `false` if the write was skipped.
    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        expire: Expiration,
        tag: Option<String>,
    ) -> Result<bool, CacheError>;

    /// Remove an entry. Returns whether an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Whether a live entry exists.
    async fn contains(&self, key: &str) -> Result<bool, CacheError>;

    /// Remove every entry, returning how many were removed when known.
    async fn clear(&self) -> Result<usize, CacheError>;

    /// Release held resources. Calling it again is a no-op.
    async fn close(&self) -> Result<(), CacheError>;
}

/// Options for [`CacheBackend::set`] and [`CacheBackend::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub timeout: Timeout,
    pub version: Option<u64>,
    pub tag: Option<String>,
}

impl SetOptions {
    pub fn timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Options for [`CacheBackend::get`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub version: Option<u64>,
    /// Also return the entry's expiration.
    pub expire_time: bool,
    /// Also return the entry's tag.
    pub tag: bool,
    /// Return a stored value as a reader instead of bytes.
    pub read: bool,
}

impl GetOptions {
    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_expire_time(mut self) -> Self {
        self.expire_time = true;
        self
    }

    pub fn with_tag(mut self) -> Self {
        self.tag = true;
        self
    }

    pub fn with_read(mut self) -> Self {
        self.read = true;
        self
    }
}

/// Value part of a [`Fetched`].
pub enum FetchedValue {
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
}

impl FetchedValue {
    /// Wrap stored bytes, as a reader when `read` is set.
    pub fn from_stored(bytes: Vec<u8>, read: bool) -> Self {
        if read {
            FetchedValue::Reader(Box::new(Cursor::new(bytes)))
        } else {
            FetchedValue::Bytes(bytes)
        }
    }

    /// The value as bytes, draining a reader if needed.
    pub fn into_bytes(self) -> std::io::Result<Vec<u8>> {
        match self {
            FetchedValue::Bytes(bytes) => Ok(bytes),
            FetchedValue::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(bytes)
            }
        }
    }
}

impl std::fmt::Debug for FetchedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchedValue::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            FetchedValue::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Result of a [`CacheBackend::get`].
///
/// `expire_time` and `tag` are only filled in when requested and the value
/// came from the store; a returned default carries no metadata and is
/// always [`FetchedValue::Bytes`].
#[derive(Debug)]
pub struct Fetched {
    pub value: FetchedValue,
    pub expire_time: Option<Expiration>,
    pub tag: Option<String>,
}

impl Fetched {
    pub fn into_value(self) -> Result<Vec<u8>, CacheError> {
        self.value
            .into_bytes()
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}

fn read_all(mut reader: Box<dyn Read + Send>) -> Result<Vec<u8>, CacheError> {
    let mut value = Vec::new();
    reader
        .read_to_end(&mut value)
        .map_err(|e| CacheError::Operation(e.to_string()))?;
    Ok(value)
}

/// Generic web-framework cache-backend contract.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store `value` only if `key` is absent. Returns whether it was stored.
    async fn add(&self, key: &str, value: Vec<u8>, options: SetOptions)
    -> Result<bool, CacheError>;

    /// Fetch `key`, falling back to `default` on a miss.
    async fn get(
        &self,
        key: &str,
        default: Option<Vec<u8>>,
        options: GetOptions,
    ) -> Result<Option<Fetched>, CacheError>;

    /// Store `value` under `key`.
    async fn set(&self, key: &str, value: Vec<u8>, options: SetOptions)
    -> Result<bool, CacheError>;

    /// Remove `key`. Absent keys are not an error.
    async fn delete(&self, key: &str, version: Option<u64>) -> Result<(), CacheError>;

    /// Whether a live entry exists for `key`.
    async fn has_key(&self, key: &str, version: Option<u64>) -> Result<bool, CacheError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Release resources held by the underlying store.
    async fn close(&self) -> Result<(), CacheError>;

    /// Fetch just the value of `key` at `version`.
    async fn get_value(
        &self,
        key: &str,
        version: Option<u64>,
    ) -> Result<Option<Vec<u8>>, CacheError> {
        let options = GetOptions {
            version,
            ..GetOptions::default()
        };
        self.get(key, None, options)
            .await?
            .map(Fetched::into_value)
            .transpose()
    }

    /// Like [`CacheBackend::set`], with the value read from `reader`.
    async fn set_from_reader(
        &self,
        key: &str,
        reader: Box<dyn Read + Send>,
        options: SetOptions,
    ) -> Result<bool, CacheError> {
        let value = read_all(reader)?;
        self.set(key, value, options).await
    }

    /// Like [`CacheBackend::add`], with the value read from `reader`.
    async fn add_from_reader(
        &self,
        key: &str,
        reader: Box<dyn Read + Send>,
        options: SetOptions,
    ) -> Result<bool, CacheError> {
        let value = read_all(reader)?;
        self.add(key, value, options).await
    }
}
