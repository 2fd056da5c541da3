//! Time-bounded decorator: empties the region once per flush interval.
//!
//! No background task is started. Staleness is checked on every access.

use super::{Cache, Lookup};
use crate::error::Result;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct ScheduledCache<C> {
    delegate: C,
    clear_interval: Duration,
    last_clear: Mutex<Instant>,
}

impl<C> ScheduledCache<C> {
    pub fn new(delegate: C, clear_interval: Duration) -> Self {
        ScheduledCache {
            delegate,
            clear_interval,
            last_clear: Mutex::new(Instant::now()),
        }
    }

    pub fn clear_interval(&self) -> Duration {
        self.clear_interval
    }

    /// Clear the delegate if the interval has elapsed. Returns whether it did.
    fn clear_when_stale<K, V>(&self) -> Result<bool>
    where
        C: Cache<K, V>,
    {
        let mut last_clear = self.last_clear.lock().unwrap_or_else(|e| e.into_inner());
        if last_clear.elapsed() < self.clear_interval {
            return Ok(false);
        }
        self.delegate.clear()?;
        *last_clear = Instant::now();
        debug!(
            "✓ Scheduled flush of region '{}' (interval: {:?})",
            self.delegate.id(),
            self.clear_interval
        );
        Ok(true)
    }
}

impl<K, V, C> Cache<K, V> for ScheduledCache<C>
where
    C: Cache<K, V>,
{
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        self.clear_when_stale::<K, V>()?;
        self.delegate.put(key, value)
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        if self.clear_when_stale::<K, V>()? {
            return Ok(Lookup::Absent);
        }
        self.delegate.get(key)
    }

    fn remove(&self, key: &K) -> Result<()> {
        self.clear_when_stale::<K, V>()?;
        self.delegate.remove(key)
    }

    fn clear(&self) -> Result<()> {
        let mut last_clear = self.last_clear.lock().unwrap_or_else(|e| e.into_inner());
        *last_clear = Instant::now();
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        if let Err(e) = self.clear_when_stale::<K, V>() {
            warn!("⚠ Scheduled flush failed while sizing region: {}", e);
        }
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryCache;
    use std::thread;

    #[test]
    fn test_entries_survive_within_interval() {
        let cache = ScheduledCache::new(
            InMemoryCache::<u32, u32>::new("scheduled"),
            Duration::from_secs(3600),
        );
        cache.put(1, Some(1)).expect("put failed");
        assert_eq!(cache.get(&1).expect("get failed"), Lookup::Hit(1));
    }

    #[test]
    fn test_entries_flushed_after_interval() {
        let cache = ScheduledCache::new(
            InMemoryCache::<u32, u32>::new("scheduled"),
            Duration::from_millis(20),
        );
        cache.put(1, Some(1)).expect("put failed");

        thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get(&1).expect("get failed"), Lookup::Absent);
        assert_eq!(Cache::<u32, u32>::size(&cache), 0);
    }
}
