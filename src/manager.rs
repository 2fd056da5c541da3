//! Transactional buffers for every region touched by one unit of work.

use crate::backend::{Cache, Lookup};
use crate::error::Result;
use crate::transactional::{ReadPolicy, TransactionalCache};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Owns one [`TransactionalCache`] per region for a single unit of work.
///
/// Buffers are created lazily the first time a region is touched and are
/// keyed by the region id. [`commit`](Self::commit) and
/// [`rollback`](Self::rollback) fan out to every buffer created so far.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use txn_cache::backend::{Cache, InMemoryCache, Lookup};
/// use txn_cache::{CacheKey, TransactionalCacheManager};
///
/// let users: Arc<dyn Cache<CacheKey, String>> = Arc::new(InMemoryCache::new("users"));
/// let key = CacheKey::from_parts(["selectUser".into(), 1.into()]);
///
/// let mut tcm = TransactionalCacheManager::new();
/// assert!(tcm.get(&users, &key).unwrap().is_miss());
/// tcm.put(&users, key.clone(), Some("alice".to_string()));
/// tcm.commit().unwrap();
///
/// assert_eq!(users.get(&key).unwrap(), Lookup::Hit("alice".to_string()));
/// ```
pub struct TransactionalCacheManager<K, V> {
    transactional_caches: HashMap<String, TransactionalCache<K, V>>,
    read_policy: ReadPolicy,
}

impl<K, V> TransactionalCacheManager<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        TransactionalCacheManager {
            transactional_caches: HashMap::new(),
            read_policy: ReadPolicy::default(),
        }
    }

    /// Read policy applied to buffers created from now on.
    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    /// Look up `key` in `cache` through this unit of work's buffer.
    ///
    /// # Errors
    /// Store failures propagate unchanged.
    pub fn get(&mut self, cache: &Arc<dyn Cache<K, V>>, key: &K) -> Result<Lookup<V>> {
        self.transactional_cache(cache).get(key)
    }

    /// Stage a write to `cache`.
    pub fn put(&mut self, cache: &Arc<dyn Cache<K, V>>, key: K, value: Option<V>) {
        self.transactional_cache(cache).put(key, value);
    }

    /// Stage a clear of `cache`.
    pub fn clear(&mut self, cache: &Arc<dyn Cache<K, V>>) {
        self.transactional_cache(cache).clear();
    }

    /// Commit every buffer touched in this unit of work.
    ///
    /// # Errors
    /// Stops at the first failing region. Regions committed before it stay
    /// committed; the failing region and those after it keep their state.
    pub fn commit(&mut self) -> Result<()> {
        for tx_cache in self.transactional_caches.values_mut() {
            tx_cache.commit()?;
        }
        Ok(())
    }

    /// Roll back every buffer touched in this unit of work.
    pub fn rollback(&mut self) {
        for tx_cache in self.transactional_caches.values_mut() {
            tx_cache.rollback();
        }
    }

    /// Number of regions touched so far.
    pub fn len(&self) -> usize {
        self.transactional_caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactional_caches.is_empty()
    }

    /// Buffer for region `id`, if it has been touched.
    pub fn buffer(&self, id: &str) -> Option<&TransactionalCache<K, V>> {
        self.transactional_caches.get(id)
    }

    fn transactional_cache(&mut self, cache: &Arc<dyn Cache<K, V>>) -> &mut TransactionalCache<K, V> {
        let read_policy = self.read_policy;
        self.transactional_caches
            .entry(cache.id().to_string())
            .or_insert_with(|| {
                trace!("Opening transactional buffer for region '{}'", cache.id());
                TransactionalCache::with_read_policy(Arc::clone(cache), read_policy)
            })
    }
}

impl<K, V> Default for TransactionalCacheManager<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryCache;
    use crate::key::CacheKey;
    use crate::transactional::tests::RecordingCache;
    use std::sync::atomic::Ordering;

    fn k(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_buffers_created_lazily_per_region() {
        let s1: Arc<dyn Cache<String, String>> = Arc::new(InMemoryCache::new("s1"));
        let s2: Arc<dyn Cache<String, String>> = Arc::new(InMemoryCache::new("s2"));
        let mut tcm = TransactionalCacheManager::new();
        assert!(tcm.is_empty());

        tcm.get(&s1, &k("a")).expect("get failed");
        tcm.put(&s1, k("a"), Some(k("1")));
        tcm.clear(&s2);

        assert_eq!(tcm.len(), 2);
        assert_eq!(tcm.buffer("s1").map(|b| b.pending_writes()), Some(1));
        assert_eq!(tcm.buffer("s2").map(|b| b.is_clear_pending()), Some(true));
    }

    #[test]
    fn test_commit_flushes_each_region_once() {
        let r1 = Arc::new(RecordingCache::new("s1"));
        let r2 = Arc::new(RecordingCache::new("s2"));
        let s1: Arc<dyn Cache<String, String>> = r1.clone();
        let s2: Arc<dyn Cache<String, String>> = r2.clone();

        let mut tcm = TransactionalCacheManager::new();
        tcm.put(&s1, k("a"), Some(k("1")));
        tcm.put(&s2, k("b"), Some(k("2")));

        tcm.commit().expect("commit failed");
        assert_eq!(r1.puts.load(Ordering::SeqCst), 1);
        assert_eq!(r2.puts.load(Ordering::SeqCst), 1);

        // Rolling back an already committed unit of work is a no-op.
        tcm.rollback();
        assert_eq!(r1.puts.load(Ordering::SeqCst), 1);
        assert_eq!(r2.puts.load(Ordering::SeqCst), 1);
        assert!(r1.removed.lock().expect("Failed to lock removed").is_empty());
        assert_eq!(
            s1.get(&k("a")).expect("get failed"),
            Lookup::Hit(k("1"))
        );
        assert_eq!(
            s2.get(&k("b")).expect("get failed"),
            Lookup::Hit(k("2"))
        );
    }

    #[test]
    fn test_second_commit_does_not_reapply_writes() {
        let r1 = Arc::new(RecordingCache::new("s1"));
        let s1: Arc<dyn Cache<String, String>> = r1.clone();

        let mut tcm = TransactionalCacheManager::new();
        tcm.put(&s1, k("a"), Some(k("1")));
        tcm.commit().expect("commit failed");
        tcm.commit().expect("commit failed");

        assert_eq!(r1.puts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rollback_discards_all_regions() {
        let s1: Arc<dyn Cache<String, String>> = Arc::new(InMemoryCache::new("s1"));
        let s2: Arc<dyn Cache<String, String>> = Arc::new(InMemoryCache::new("s2"));
        s2.put(k("keep"), Some(k("x"))).expect("put failed");

        let mut tcm = TransactionalCacheManager::new();
        tcm.put(&s1, k("a"), Some(k("1")));
        tcm.clear(&s2);
        tcm.rollback();

        assert_eq!(s1.size(), 0);
        assert_eq!(s2.size(), 1);
    }

    #[test]
    fn test_same_region_shares_one_buffer() {
        let store: Arc<dyn Cache<CacheKey, u32>> = Arc::new(InMemoryCache::new("users"));
        let alias = Arc::clone(&store);
        let key = CacheKey::from_parts(["select".into()]);

        let mut tcm = TransactionalCacheManager::new();
        tcm.put(&store, key.clone(), Some(7));

        assert_eq!(tcm.get(&alias, &key).expect("get failed"), Lookup::Hit(7));
        assert_eq!(tcm.len(), 1);
    }

    #[test]
    fn test_delegate_only_policy_applies_to_new_buffers() {
        let store: Arc<dyn Cache<String, u32>> = Arc::new(InMemoryCache::new("s"));
        let mut tcm = TransactionalCacheManager::new().with_read_policy(ReadPolicy::DelegateOnly);

        tcm.put(&store, k("a"), Some(1));
        assert_eq!(tcm.get(&store, &k("a")).expect("get failed"), Lookup::Absent);
        assert_eq!(
            tcm.buffer("s").map(|b| b.read_policy()),
            Some(ReadPolicy::DelegateOnly)
        );
    }
}
