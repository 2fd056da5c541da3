//! Caching executor - the caller-side flow around an expensive operation.

use crate::backend::{Cache, Lookup};
use crate::error::Result;
use crate::key::CacheKey;
use crate::manager::TransactionalCacheManager;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::strategy::CacheStrategy;
use crate::transactional::ReadPolicy;
use std::sync::Arc;
use std::time::Instant;

/// Runs cached operations for one unit of work.
///
/// Lookups and write-backs go through a [`TransactionalCacheManager`], so
/// results loaded here become visible to other units of work only after
/// [`commit`](Self::commit).
///
/// # Example
///
/// ```
/// use txn_cache::{CacheBuilder, CacheKeyBuilder, CacheStrategy, CachingExecutor};
///
/// let users = CacheBuilder::new("UserMapper").build::<_, Vec<String>>().unwrap();
/// let key = CacheKeyBuilder::statement("UserMapper.selectAll").build();
///
/// let mut executor = CachingExecutor::new();
/// let rows = executor
///     .query(&users, &key, CacheStrategy::Refresh, || Ok(vec!["alice".to_string()]))
///     .unwrap();
/// executor.commit().unwrap();
///
/// assert_eq!(rows, Some(vec!["alice".to_string()]));
/// ```
pub struct CachingExecutor<V> {
    manager: TransactionalCacheManager<CacheKey, V>,
    metrics: Box<dyn CacheMetrics>,
}

impl<V: Clone> CachingExecutor<V> {
    /// Create an executor for a fresh unit of work.
    pub fn new() -> Self {
        CachingExecutor {
            manager: TransactionalCacheManager::new(),
            metrics: Box::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set how lookups treat this unit of work's staged writes.
    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.manager = TransactionalCacheManager::new().with_read_policy(read_policy);
        self
    }

    /// Run a cached operation.
    ///
    /// # Arguments
    /// - `cache`: region holding results of this operation
    /// - `key`: identity of this invocation
    /// - `strategy`: how to use the region (Fresh, Refresh, Invalidate, Bypass)
    /// - `loader`: the expensive operation, run at most once
    ///
    /// Returns `None` only for [`CacheStrategy::Fresh`] on a miss.
    ///
    /// # Errors
    ///
    /// - `Error::BackendError`, `Error::Timeout`, `Error::DeserializationError`:
    ///   the region failed; nothing is swallowed on this path
    /// - any error returned by `loader`
    pub fn query<F>(
        &mut self,
        cache: &Arc<dyn Cache<CacheKey, V>>,
        key: &CacheKey,
        strategy: CacheStrategy,
        loader: F,
    ) -> Result<Option<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let timer = Instant::now();
        debug!(
            "» Cached query on '{}' for key {} (strategy: {})",
            cache.id(),
            key,
            strategy
        );

        let result = match strategy {
            CacheStrategy::Fresh => self.strategy_fresh(cache, key),
            CacheStrategy::Refresh => self.strategy_refresh(cache, key, loader),
            CacheStrategy::Invalidate => self.strategy_invalidate(cache, key, loader),
            CacheStrategy::Bypass => {
                debug!("Bypassing cache entirely for {}", key);
                loader().map(|value| (Some(value), false))
            }
        };

        match result {
            Ok((value, true)) => {
                self.metrics.record_hit(cache.id(), timer.elapsed());
                Ok(value)
            }
            Ok((value, false)) => {
                self.metrics.record_miss(cache.id(), timer.elapsed());
                Ok(value)
            }
            Err(e) => {
                self.metrics.record_error(cache.id(), &e.to_string());
                Err(e)
            }
        }
    }

    /// Stage a clear of `cache`, as a write statement does.
    pub fn flush(&mut self, cache: &Arc<dyn Cache<CacheKey, V>>) {
        debug!("Flushing region '{}' on commit", cache.id());
        self.manager.clear(cache);
    }

    /// Publish everything this unit of work staged.
    ///
    /// # Errors
    /// Store failures propagate; roll back afterwards to release locks.
    pub fn commit(&mut self) -> Result<()> {
        self.manager.commit()
    }

    /// Discard everything this unit of work staged.
    pub fn rollback(&mut self) {
        self.manager.rollback();
    }

    pub fn manager(&self) -> &TransactionalCacheManager<CacheKey, V> {
        &self.manager
    }

    /// Cache only, no loader fallback. Returns `(value, was_hit)`.
    fn strategy_fresh(
        &mut self,
        cache: &Arc<dyn Cache<CacheKey, V>>,
        key: &CacheKey,
    ) -> Result<(Option<V>, bool)> {
        match self.manager.get(cache, key)? {
            Lookup::Hit(value) => {
                debug!("✓ Cache hit (Fresh strategy)");
                Ok((Some(value), true))
            }
            _ => {
                debug!("✗ Cache miss (Fresh strategy) - no fallback");
                Ok((None, false))
            }
        }
    }

    /// Try the region, run the loader on a miss and stage its result.
    fn strategy_refresh<F>(
        &mut self,
        cache: &Arc<dyn Cache<CacheKey, V>>,
        key: &CacheKey,
        loader: F,
    ) -> Result<(Option<V>, bool)>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Lookup::Hit(value) = self.manager.get(cache, key)? {
            debug!("✓ Cache hit (Refresh strategy)");
            return Ok((Some(value), true));
        }

        debug!("Cache miss, running loader");
        let value = loader()?;
        self.manager.put(cache, key.clone(), Some(value.clone()));
        Ok((Some(value), false))
    }

    /// Stage a region clear, then load and stage a fresh value.
    fn strategy_invalidate<F>(
        &mut self,
        cache: &Arc<dyn Cache<CacheKey, V>>,
        key: &CacheKey,
        loader: F,
    ) -> Result<(Option<V>, bool)>
    where
        F: FnOnce() -> Result<V>,
    {
        self.manager.clear(cache);
        debug!("✓ Region '{}' invalidated for {}", cache.id(), key);

        let value = loader()?;
        self.manager.put(cache, key.clone(), Some(value.clone()));
        Ok((Some(value), false))
    }
}

impl<V: Clone> Default for CachingExecutor<V> {
    fn default() -> Self {
        Self::new()
    }
}
