//! Hit-ratio logging decorator.

use super::{Cache, Lookup};
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts lookups and hits and logs the running hit ratio at debug level.
pub struct LoggingCache<C> {
    delegate: C,
    requests: AtomicU64,
    hits: AtomicU64,
}

impl<C> LoggingCache<C> {
    pub fn new(delegate: C) -> Self {
        LoggingCache {
            delegate,
            requests: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that were hits, `0.0` before the first lookup.
    pub fn hit_ratio(&self) -> f64 {
        let requests = self.requests();
        if requests == 0 {
            return 0.0;
        }
        self.hits() as f64 / requests as f64
    }
}

impl<K, V, C> Cache<K, V> for LoggingCache<C>
where
    C: Cache<K, V>,
{
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        self.delegate.put(key, value)
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let lookup = self.delegate.get(key)?;
        if lookup.is_hit() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            "Cache Hit Ratio [{}]: {:.4}",
            self.delegate.id(),
            self.hit_ratio()
        );
        Ok(lookup)
    }

    fn remove(&self, key: &K) -> Result<()> {
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryCache;

    #[test]
    fn test_hit_ratio() {
        let cache = LoggingCache::new(InMemoryCache::<u32, u32>::new("logged"));
        assert_eq!(cache.hit_ratio(), 0.0);

        cache.put(1, Some(1)).expect("put failed");
        cache.get(&1).expect("get failed");
        cache.get(&2).expect("get failed");

        assert_eq!(cache.requests(), 2);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.hit_ratio(), 0.5);
    }

    #[test]
    fn test_negative_entry_is_not_a_hit() {
        let cache = LoggingCache::new(InMemoryCache::<u32, u32>::new("logged"));
        cache.put(1, None).expect("put failed");
        cache.get(&1).expect("get failed");
        assert_eq!(cache.hits(), 0);
    }
}
