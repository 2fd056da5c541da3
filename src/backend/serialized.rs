//! Read-write decorator storing values as enveloped bytes.
//!
//! Every lookup decodes a fresh copy, so callers can mutate what they get back
//! without affecting other units of work. Entries whose envelope no longer
//! matches the current schema surface as errors.

use super::{Cache, Lookup};
use crate::error::Result;
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Adapts a byte-valued store into a store of `V`.
///
/// # Example
///
/// ```
/// use txn_cache::backend::{Cache, InMemoryCache, Lookup, SerializedCache};
///
/// let cache = SerializedCache::new(InMemoryCache::<u32, Vec<u8>>::new("rows"));
/// cache.put(1, Some(vec!["a".to_string()])).unwrap();
/// let hit: Lookup<Vec<String>> = cache.get(&1).unwrap();
/// assert_eq!(hit, Lookup::Hit(vec!["a".to_string()]));
/// ```
pub struct SerializedCache<C> {
    delegate: C,
}

impl<C> SerializedCache<C> {
    pub fn new(delegate: C) -> Self {
        SerializedCache { delegate }
    }
}

impl<K, V, C> Cache<K, V> for SerializedCache<C>
where
    C: Cache<K, Vec<u8>>,
    V: Serialize + DeserializeOwned,
{
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        let bytes = value.as_ref().map(serialize_for_cache).transpose()?;
        self.delegate.put(key, bytes)
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        match self.delegate.get(key)? {
            Lookup::Hit(bytes) => deserialize_from_cache(&bytes).map(Lookup::Hit),
            Lookup::Negative => Ok(Lookup::Negative),
            Lookup::Absent => Ok(Lookup::Absent),
        }
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
