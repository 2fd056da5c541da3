//! Per-transaction write buffer for one cache region.
//!
//! Writes made during a unit of work are staged locally and only reach the
//! shared store on [`commit`](TransactionalCache::commit). A
//! [`rollback`](TransactionalCache::rollback) discards them. Keys that missed
//! in the store are remembered so that any per-key lock taken by a blocking
//! store is released on both paths: commit publishes a "no value" entry for
//! each miss that was never written, rollback calls `remove` for each miss.

use crate::backend::{Cache, Lookup};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// How lookups treat state staged by the same unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Staged writes are returned before the store is consulted. A key that
    /// already missed in this unit of work is answered without asking the
    /// store again, with the kind of miss the store first reported.
    #[default]
    ReadOwnWrites,
    /// Every lookup reads through to the store; staged writes are invisible
    /// until commit, even to the unit of work that staged them.
    DelegateOnly,
}

/// Write buffer wrapping one shared store for one unit of work.
///
/// Not internally synchronized: a unit of work is driven by one caller at a
/// time. The buffer is reusable; commit and rollback both reset it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use txn_cache::backend::{Cache, InMemoryCache, Lookup};
/// use txn_cache::TransactionalCache;
///
/// let store = InMemoryCache::<u32, String>::new("users");
/// let mut tx: TransactionalCache<u32, String> = TransactionalCache::new(Arc::new(store.clone()));
///
/// tx.put(1, Some("alice".to_string()));
/// assert_eq!(store.get(&1).unwrap(), Lookup::Absent);
///
/// tx.commit().unwrap();
/// assert_eq!(store.get(&1).unwrap(), Lookup::Hit("alice".to_string()));
/// ```
pub struct TransactionalCache<K, V> {
    delegate: Arc<dyn Cache<K, V>>,
    read_policy: ReadPolicy,
    clear_on_commit: bool,
    entries_to_add_on_commit: HashMap<K, Option<V>>,
    /// Missed keys, mapped to whether the store held them as "no value".
    entries_missed_in_cache: HashMap<K, bool>,
}

impl<K, V> TransactionalCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(delegate: Arc<dyn Cache<K, V>>) -> Self {
        Self::with_read_policy(delegate, ReadPolicy::default())
    }

    pub fn with_read_policy(delegate: Arc<dyn Cache<K, V>>, read_policy: ReadPolicy) -> Self {
        TransactionalCache {
            delegate,
            read_policy,
            clear_on_commit: false,
            entries_to_add_on_commit: HashMap::new(),
            entries_missed_in_cache: HashMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        self.delegate.id()
    }

    pub fn size(&self) -> usize {
        self.delegate.size()
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    /// The shared store this buffer flushes into.
    pub fn delegate(&self) -> &Arc<dyn Cache<K, V>> {
        &self.delegate
    }

    /// Look up `key`.
    ///
    /// A lookup that is not a hit in the store records `key` as missed. While
    /// a clear is pending, store content is reported as absent.
    ///
    /// # Errors
    /// Store failures propagate unchanged.
    pub fn get(&mut self, key: &K) -> Result<Lookup<V>> {
        if self.read_policy == ReadPolicy::ReadOwnWrites {
            if let Some(staged) = self.entries_to_add_on_commit.get(key) {
                trace!("Staged entry served for key {:?}", key);
                return Ok(Lookup::from(staged.clone()));
            }
            if let Some(&negative) = self.entries_missed_in_cache.get(key) {
                return Ok(if negative && !self.clear_on_commit {
                    Lookup::Negative
                } else {
                    Lookup::Absent
                });
            }
        }

        let lookup = self.delegate.get(key)?;
        if lookup.is_miss() {
            self.entries_missed_in_cache
                .insert(key.clone(), matches!(lookup, Lookup::Negative));
        }

        if self.clear_on_commit {
            Ok(Lookup::Absent)
        } else {
            Ok(lookup)
        }
    }

    /// Stage `value` for `key`. Nothing reaches the store before commit.
    pub fn put(&mut self, key: K, value: Option<V>) {
        self.entries_to_add_on_commit.insert(key, value);
    }

    /// No-op. Entries leave the store only through `clear` or rollback.
    pub fn remove(&mut self, key: &K) {
        trace!("Ignoring transactional remove of key {:?}", key);
    }

    /// Discard every staged write and schedule a store clear for commit.
    pub fn clear(&mut self) {
        self.clear_on_commit = true;
        self.entries_to_add_on_commit.clear();
    }

    /// Flush the unit of work into the store.
    ///
    /// Order: pending clear, staged writes, then a "no value" entry for every
    /// missed key that was not written.
    ///
    /// # Errors
    /// On store failure the buffer keeps its state; the flush may be partial.
    /// Callers should roll back or abandon the unit of work.
    pub fn commit(&mut self) -> Result<()> {
        if self.clear_on_commit {
            self.delegate.clear()?;
        }
        self.flush_pending_entries()?;
        debug!(
            "✓ Committed {} staged and {} missed entries to '{}'",
            self.entries_to_add_on_commit.len(),
            self.entries_missed_in_cache.len(),
            self.delegate.id()
        );
        self.reset();
        Ok(())
    }

    /// Discard the unit of work and release every lock its misses hold.
    ///
    /// Never fails: unlock errors are logged and the sweep continues.
    pub fn rollback(&mut self) {
        self.unlock_missed_entries();
        self.reset();
    }

    pub fn is_clear_pending(&self) -> bool {
        self.clear_on_commit
    }

    pub fn pending_writes(&self) -> usize {
        self.entries_to_add_on_commit.len()
    }

    pub fn missed_keys(&self) -> usize {
        self.entries_missed_in_cache.len()
    }

    fn reset(&mut self) {
        self.clear_on_commit = false;
        self.entries_to_add_on_commit.clear();
        self.entries_missed_in_cache.clear();
    }

    fn flush_pending_entries(&self) -> Result<()> {
        for (key, value) in &self.entries_to_add_on_commit {
            self.delegate.put(key.clone(), value.clone())?;
        }
        for key in self.entries_missed_in_cache.keys() {
            if !self.entries_to_add_on_commit.contains_key(key) {
                self.delegate.put(key.clone(), None)?;
            }
        }
        Ok(())
    }

    fn unlock_missed_entries(&self) {
        for key in self.entries_missed_in_cache.keys() {
            if let Err(e) = self.delegate.remove(key) {
                warn!(
                    "⚠ Unexpected error while notifying a rollback to cache '{}' for key {:?}: {}",
                    self.delegate.id(),
                    key,
                    e
                );
            }
        }
    }
}
