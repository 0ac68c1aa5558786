//! Fully-qualified key construction.

use std::fmt;
use std::sync::Arc;

/// Longest key that stays portable across cache backends.
pub const MAX_KEY_LENGTH: usize = 250;

/// Custom key function: `(raw key, prefix, version) -> fully-qualified key`.
pub type KeyFunc = Arc<dyn Fn(&str, &str, u64) -> String + Send + Sync>;

/// Builds the keys actually used to address the store.
///
/// Keys default to `"{prefix}:{version}:{key}"`, so different versions of the
/// same raw key never collide.
#[derive(Clone)]
pub struct KeyBuilder {
    prefix: String,
    default_version: u64,
    key_func: Option<KeyFunc>,
}

impl KeyBuilder {
    pub fn new(prefix: impl Into<String>, default_version: u64) -> Self {
        Self {
            prefix: prefix.into(),
            default_version,
            key_func: None,
        }
    }

    /// Replace the default `prefix:version:key` layout.
    pub fn with_key_func(mut self, key_func: KeyFunc) -> Self {
        self.key_func = Some(key_func);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_version(&self) -> u64 {
        self.default_version
    }

    /// Build the fully-qualified key for `key` at `version`.
    pub fn make_key(&self, key: &str, version: Option<u64>) -> String {
        let version = version.unwrap_or(self.default_version);
        match &self.key_func {
            Some(key_func) => key_func(key, &self.prefix, version),
            None => format!("{}:{}:{}", self.prefix, version, key),
        }
    }

    /// Build the key and report portability problems as warnings.
    pub fn make_and_validate_key(&self, key: &str, version: Option<u64>) -> String {
        let full_key = self.make_key(key, version);
        validate_key(&full_key);
        full_key
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new("", 1)
    }
}

impl fmt::Debug for KeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyBuilder")
            .field("prefix", &self.prefix)
            .field("default_version", &self.default_version)
            .field("custom_key_func", &self.key_func.is_some())
            .finish()
    }
}

/// A reason a key may not work with every cache backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyWarning {
    TooLong { length: usize },
    InvalidCharacter { character: char },
}

impl fmt::Display for KeyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyWarning::TooLong { length } => write!(
                f,
                "key is {} characters long, more than the portable maximum of {}",
                length, MAX_KEY_LENGTH
            ),
            KeyWarning::InvalidCharacter { character } => {
                write!(f, "key contains non-portable character {:?}", character)
            }
        }
    }
}

/// Check a fully-qualified key for portability problems.
///
/// Never fails; each problem is logged at `warn` and returned.
pub fn validate_key(key: &str) -> Vec<KeyWarning> {
    let mut warnings = Vec::new();

    let length = key.chars().count();
    if length > MAX_KEY_LENGTH {
        warnings.push(KeyWarning::TooLong { length });
    }

    if let Some(character) = key.chars().find(|c| *c < '!' || *c == '\x7f') {
        warnings.push(KeyWarning::InvalidCharacter { character });
    }

    for warning in &warnings {
        tracing::warn!(key = %key, "{}", warning);
    }
    warnings
}
