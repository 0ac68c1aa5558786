//! Timeout normalization.
//!
//! The framework contract overloads a single timeout argument with three
//! meanings: "use the configured default", "expire immediately" and "never
//! expire". [`Timeout`] keeps them apart and [`Timeout::translate`] turns one
//! into the store-native [`Expiration`].

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// Per-call timeout as accepted by the cache contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// Use the timeout configured on the cache.
    #[default]
    UseDefault,
    /// Expire immediately.
    Zero,
    /// Expire this many seconds from now. Always greater than zero.
    Seconds(u64),
    /// Never expire.
    Never,
}

impl Timeout {
    /// Build a timeout from a number of seconds, mapping `0` to [`Timeout::Zero`].
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Timeout::Zero
        } else {
            Timeout::Seconds(secs)
        }
    }

    /// Resolve this timeout against the configured default, using the current time.
    pub fn translate(self, default: Option<u64>) -> Expiration {
        self.translate_at(Timestamp::now(), default)
    }

    /// Resolve this timeout against the configured default at `now`.
    ///
    /// `default` follows the configuration convention: `None` never expires,
    /// `Some(0)` expires immediately, `Some(n)` expires after `n` seconds.
    pub fn translate_at(self, now: Timestamp, default: Option<u64>) -> Expiration {
        match self {
            Timeout::UseDefault => Timeout::from(default).translate_at(now, default),
            // Fixed sentinel rather than `now`, so a zero timeout can never be
            // read back because of clock granularity.
            Timeout::Zero => Expiration::EXPIRED,
            Timeout::Never => Expiration::Never,
            Timeout::Seconds(secs) => {
                let secs = i64::try_from(secs).unwrap_or(i64::MAX);
                let at = now
                    .checked_add(SignedDuration::from_secs(secs))
                    .unwrap_or(Timestamp::MAX);
                Expiration::At(at)
            }
        }
    }
}

impl From<Option<u64>> for Timeout {
    fn from(value: Option<u64>) -> Self {
        match value {
            None => Timeout::Never,
            Some(secs) => Timeout::from_secs(secs),
        }
    }
}

impl std::fmt::Display for Timeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timeout::UseDefault => f.write_str("default"),
            Timeout::Zero => f.write_str("0"),
            Timeout::Seconds(secs) => write!(f, "{secs}"),
            Timeout::Never => f.write_str("never"),
        }
    }
}

impl std::str::FromStr for Timeout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(Timeout::UseDefault),
            "never" | "none" => Ok(Timeout::Never),
            other => other.parse::<u64>().map(Timeout::from_secs).map_err(|_| {
                format!(
                    "Invalid timeout '{}'. Expected seconds, 'never' or 'default'",
                    s
                )
            }),
        }
    }
}

/// Store-native expiration of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expiration {
    Never,
    At(Timestamp),
}

impl Expiration {
    /// An expiration that has always already elapsed.
    pub const EXPIRED: Expiration = Expiration::At(Timestamp::UNIX_EPOCH);

    /// Whether the entry must be treated as a miss at `now`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        match self {
            Expiration::Never => false,
            Expiration::At(at) => *at <= now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Timestamp::now())
    }

    /// The expiration instant, if any.
    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Expiration::Never => None,
            Expiration::At(at) => Some(*at),
        }
    }
}

impl std::fmt::Display for Expiration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expiration::Never => f.write_str("never"),
            Expiration::At(at) => write!(f, "{at}"),
        }
    }
}
