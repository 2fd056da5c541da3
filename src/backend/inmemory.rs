//! In-memory base store backed by a concurrent hash map.

use super::{Cache, Lookup};
use crate::error::Result;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Unbounded in-memory store. Entries stay until removed or cleared.
///
/// Clones share the same entries, so a clone can be handed to the
/// transactional layer while the original is inspected.
///
/// # Example
///
/// ```
/// use txn_cache::backend::{Cache, InMemoryCache};
///
/// let cache = InMemoryCache::<u64, String>::new("orders");
/// cache.put(1, None).unwrap();
/// assert_eq!(cache.size(), 1);
/// ```
#[derive(Clone)]
pub struct InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    id: Arc<str>,
    entries: Arc<DashMap<K, Option<V>>>,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty region.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        debug!("✓ In-memory cache region '{}' created", id);
        InMemoryCache {
            id: Arc::from(id),
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Whether `key` has a slot, including a cached "no value" slot.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Cache<K, V> for InMemoryCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        Ok(match self.entries.get(key) {
            Some(slot) => Lookup::from(slot.value().clone()),
            None => Lookup::Absent,
        })
    }

    fn remove(&self, key: &K) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        warn!(
            "⚠ Clearing all {} entries of region '{}'",
            self.entries.len(),
            self.id
        );
        self.entries.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let cache = InMemoryCache::<String, String>::new("test");
        let key = "k".to_string();

        cache.put(key.clone(), Some("v1".to_string())).expect("put failed");
        cache.put(key.clone(), Some("v2".to_string())).expect("put failed");

        assert_eq!(
            cache.get(&key).expect("get failed"),
            Lookup::Hit("v2".to_string())
        );
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_negative_and_absent_are_distinct() {
        let cache = InMemoryCache::<u32, String>::new("test");
        cache.put(1, None).expect("put failed");

        assert_eq!(cache.get(&1).expect("get failed"), Lookup::Negative);
        assert_eq!(cache.get(&2).expect("get failed"), Lookup::Absent);
        assert!(cache.contains_key(&1));
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let cache = InMemoryCache::<u32, u32>::new("test");
        assert!(cache.remove(&42).is_ok());
    }

    #[test]
    fn test_clear() {
        let cache = InMemoryCache::<u32, u32>::new("test");
        cache.put(1, Some(1)).expect("put failed");
        cache.put(2, None).expect("put failed");
        cache.clear().expect("clear failed");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = InMemoryCache::<u32, u32>::new("test");
        let clone = cache.clone();
        clone.put(1, Some(10)).expect("put failed");
        assert_eq!(cache.get(&1).expect("get failed"), Lookup::Hit(10));
    }
}
