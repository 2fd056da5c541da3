//! Region configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding [`CacheConfig::flush_interval_ms`].
pub const FLUSH_INTERVAL_ENV: &str = "TXN_CACHE_FLUSH_INTERVAL_MS";

/// Environment variable overriding [`CacheConfig::lock_timeout_ms`].
pub const LOCK_TIMEOUT_ENV: &str = "TXN_CACHE_LOCK_TIMEOUT_MS";

/// Decorator settings for one cache region.
///
/// # Example
///
/// ```
/// use txn_cache::config::CacheConfig;
///
/// let config = CacheConfig::from_json(r#"{ "flush_interval_ms": 60000, "blocking": true }"#).unwrap();
/// assert!(config.blocking);
/// assert!(config.read_write);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Empty the region once this many milliseconds have passed.
    pub flush_interval_ms: Option<u64>,
    /// Store values as serialized copies.
    pub read_write: bool,
    /// Log the hit ratio on every lookup.
    pub logging: bool,
    /// Lock keys on miss so concurrent callers wait for one computation.
    pub blocking: bool,
    /// Give up waiting for a key lock after this many milliseconds.
    pub lock_timeout_ms: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            flush_interval_ms: None,
            read_write: true,
            logging: true,
            blocking: false,
            lock_timeout_ms: None,
        }
    }
}

impl CacheConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CacheConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `TXN_CACHE_FLUSH_INTERVAL_MS` and
    /// `TXN_CACHE_LOCK_TIMEOUT_MS`. Unparseable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = env_millis(FLUSH_INTERVAL_ENV) {
            self.flush_interval_ms = Some(ms);
        }
        if let Some(ms) = env_millis(LOCK_TIMEOUT_ENV) {
            self.lock_timeout_ms = Some(ms);
        }
        self
    }

    /// # Errors
    /// Returns `Error::ConfigError` for a zero flush interval or lock timeout.
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval_ms == Some(0) {
            return Err(Error::ConfigError(
                "flush_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.lock_timeout_ms == Some(0) {
            return Err(Error::ConfigError(
                "lock_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.lock_timeout_ms.is_some() && !self.blocking {
            warn!("⚠ lock_timeout_ms is set but blocking is disabled; the timeout is ignored");
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval_ms.map(Duration::from_millis)
    }

    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

fn env_millis(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!("⚠ Ignoring {}={:?}: not a millisecond count", name, raw);
            None
        }
    }
}
