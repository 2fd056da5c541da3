//! Per-key blocking decorator.
//!
//! A lookup that misses leaves the key locked, so concurrent callers asking
//! for the same key wait instead of all running the expensive operation. The
//! caller that missed releases the lock with `put` (value computed) or
//! `remove` (gave up). Locks are not reentrant.

use super::{Cache, Lookup};
use crate::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// One-shot latch: waiters block until `release` is called.
struct Latch {
    released: Mutex<bool>,
    cond: Condvar,
}

impl Latch {
    fn new() -> Self {
        Latch {
            released: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn release(&self) {
        let mut released = self.released.lock().unwrap_or_else(|e| e.into_inner());
        *released = true;
        self.cond.notify_all();
    }

    /// Returns `false` if the timeout elapsed before release.
    fn wait(&self, timeout: Option<Duration>) -> bool {
        let released = self.released.lock().unwrap_or_else(|e| e.into_inner());
        match timeout {
            Some(timeout) => {
                let (released, _) = self
                    .cond
                    .wait_timeout_while(released, timeout, |released| !*released)
                    .unwrap_or_else(|e| e.into_inner());
                *released
            }
            None => {
                let released = self
                    .cond
                    .wait_while(released, |released| !*released)
                    .unwrap_or_else(|e| e.into_inner());
                *released
            }
        }
    }
}

/// Decorator that serializes concurrent misses on the same key.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use txn_cache::backend::{BlockingCache, Cache, InMemoryCache};
///
/// let cache = BlockingCache::new(InMemoryCache::<u32, String>::new("users"))
///     .with_timeout(Duration::from_millis(500));
///
/// // Miss: the key is now locked by this caller.
/// assert!(cache.get(&1).unwrap().is_miss());
/// // Publishing the value releases it.
/// cache.put(1, Some("alice".to_string())).unwrap();
/// assert!(cache.get(&1).unwrap().is_hit());
/// ```
pub struct BlockingCache<K, C>
where
    K: Eq + Hash,
{
    delegate: C,
    locks: DashMap<K, Arc<Latch>>,
    timeout: Option<Duration>,
}

impl<K, C> BlockingCache<K, C>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(delegate: C) -> Self {
        BlockingCache {
            delegate,
            locks: DashMap::new(),
            timeout: None,
        }
    }

    /// Fail lookups with [`Error::Timeout`] instead of waiting forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of keys currently locked.
    pub fn locked_keys(&self) -> usize {
        self.locks.len()
    }

    pub fn delegate(&self) -> &C {
        &self.delegate
    }

    fn acquire_lock(&self, key: &K) -> Result<()> {
        loop {
            let held = match self.locks.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(Latch::new()));
                    return Ok(());
                }
                Entry::Occupied(slot) => Arc::clone(slot.get()),
            };

            trace!("Waiting for lock on key {:?}", key);
            if !held.wait(self.timeout) {
                return Err(Error::Timeout(format!(
                    "Couldn't get a lock in {:?} for the key {:?}",
                    self.timeout.unwrap_or_default(),
                    key
                )));
            }
        }
    }

    fn release_lock(&self, key: &K) {
        match self.locks.remove(key) {
            Some((_, latch)) => latch.release(),
            None => trace!("No lock held for key {:?}", key),
        }
    }
}

impl<K, V, C> Cache<K, V> for BlockingCache<K, C>
where
    K: Eq + Hash + Clone + Debug + Send + Sync,
    C: Cache<K, V>,
{
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        let lock_key = key.clone();
        let result = self.delegate.put(key, value);
        self.release_lock(&lock_key);
        result
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        self.acquire_lock(key)?;
        match self.delegate.get(key) {
            Ok(Lookup::Hit(value)) => {
                self.release_lock(key);
                Ok(Lookup::Hit(value))
            }
            // Lock stays with the caller until put or remove.
            Ok(miss) => Ok(miss),
            Err(e) => {
                self.release_lock(key);
                Err(e)
            }
        }
    }

    /// Only releases the lock on `key`; the stored entry is left untouched.
    fn remove(&self, key: &K) -> Result<()> {
        self.release_lock(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.delegate.clear()
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
