//! Builder assembling the decorator stack for one cache region.

use crate::backend::{
    BlockingCache, Cache, InMemoryCache, LoggingCache, ScheduledCache, SerializedCache,
};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Fluent builder for a region's store.
///
/// Decorators are applied in a fixed order around the base store:
/// scheduled flush, serialization, logging, then blocking outermost.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use txn_cache::{CacheBuilder, CacheKey};
///
/// let cache = CacheBuilder::new("UserMapper")
///     .flush_interval(Duration::from_secs(60))
///     .blocking(true)
///     .lock_timeout(Duration::from_secs(5))
///     .build::<CacheKey, Vec<String>>()
///     .unwrap();
///
/// assert_eq!(cache.id(), "UserMapper");
/// ```
#[derive(Clone, Debug)]
pub struct CacheBuilder {
    id: String,
    config: CacheConfig,
}

impl CacheBuilder {
    /// Create a builder with default settings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            config: CacheConfig::default(),
        }
    }

    /// Replace all settings at once.
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_ms = Some(saturating_millis(interval));
        self
    }

    pub fn read_write(mut self, read_write: bool) -> Self {
        self.config.read_write = read_write;
        self
    }

    pub fn logging(mut self, logging: bool) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.config.blocking = blocking;
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout_ms = Some(saturating_millis(timeout));
        self
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Build the region on an in-memory base store.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for an empty id or invalid settings.
    pub fn build<K, V>(self) -> Result<Arc<dyn Cache<K, V>>>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        self.check()?;

        let cache: Box<dyn Cache<K, V>> = if self.config.read_write {
            let base = InMemoryCache::<K, Vec<u8>>::new(self.id.clone());
            Box::new(SerializedCache::new(self.scheduled(base)))
        } else {
            let base = InMemoryCache::<K, V>::new(self.id.clone());
            self.scheduled(base)
        };

        info!(
            "✓ Cache region '{}' built (read_write: {}, blocking: {})",
            self.id, self.config.read_write, self.config.blocking
        );
        Ok(self.standard_decorators(cache))
    }

    /// Decorate a caller-supplied base store.
    ///
    /// Serialization is the base store's concern here, so `read_write` is
    /// ignored.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for invalid settings or if the base
    /// store's id differs from the builder's.
    pub fn build_on<K, V, C>(self, base: C) -> Result<Arc<dyn Cache<K, V>>>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        V: 'static,
        C: Cache<K, V> + 'static,
    {
        self.check()?;
        if base.id() != self.id {
            return Err(Error::ConfigError(format!(
                "Base store id '{}' does not match region id '{}'",
                base.id(),
                self.id
            )));
        }

        let cache = self.scheduled(base);
        info!("✓ Cache region '{}' built on custom store", self.id);
        Ok(self.standard_decorators(cache))
    }

    fn check(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::ConfigError(
                "Cache instances require an id".to_string(),
            ));
        }
        self.config.validate()
    }

    fn scheduled<K, V, C>(&self, base: C) -> Box<dyn Cache<K, V>>
    where
        K: 'static,
        V: 'static,
        C: Cache<K, V> + 'static,
    {
        match self.config.flush_interval() {
            Some(interval) => Box::new(ScheduledCache::new(base, interval)),
            None => Box::new(base),
        }
    }

    fn standard_decorators<K, V>(&self, mut cache: Box<dyn Cache<K, V>>) -> Arc<dyn Cache<K, V>>
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
        V: 'static,
    {
        if self.config.logging {
            cache = Box::new(LoggingCache::new(cache));
        }
        if self.config.blocking {
            let mut blocking = BlockingCache::new(cache);
            if let Some(timeout) = self.config.lock_timeout() {
                blocking = blocking.with_timeout(timeout);
            }
            cache = Box::new(blocking);
        }
        Arc::from(cache)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
