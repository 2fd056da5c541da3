//! Cache store contract and implementations.
//!
//! A region is served by a base store ([`InMemoryCache`]) wrapped in any
//! number of decorators. Every layer implements [`Cache`], so decorators can be
//! stacked in any order and the stack is used exactly like a single store.

pub mod blocking;
pub mod inmemory;
pub mod logging;
pub mod scheduled;
pub mod serialized;

pub use blocking::BlockingCache;
pub use inmemory::InMemoryCache;
pub use logging::LoggingCache;
pub use scheduled::ScheduledCache;
pub use serialized::SerializedCache;

use crate::error::Result;
use std::sync::Arc;

/// Outcome of a store lookup.
///
/// Stores keep `None` values as a verified miss marker, so a lookup has three
/// outcomes instead of two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Key present with a value.
    Hit(V),
    /// Key present, cached as "no value".
    Negative,
    /// Key never written (or evicted).
    Absent,
}

impl<V> Lookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Anything that is not a hit. The caller still has to compute the value.
    pub fn is_miss(&self) -> bool {
        !self.is_hit()
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Lookup::Hit(v) => Some(v),
            Lookup::Negative | Lookup::Absent => None,
        }
    }

    pub fn map<U, F: FnOnce(V) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Hit(v) => Lookup::Hit(f(v)),
            Lookup::Negative => Lookup::Negative,
            Lookup::Absent => Lookup::Absent,
        }
    }
}

impl<V> From<Option<V>> for Lookup<V> {
    /// Convert a stored slot into a lookup result.
    fn from(stored: Option<V>) -> Self {
        match stored {
            Some(v) => Lookup::Hit(v),
            None => Lookup::Negative,
        }
    }
}

/// Storage contract for one cache region.
///
/// Implementations use interior mutability and are shared across units of
/// work as `Arc<dyn Cache<K, V>>`. Stores that serialize concurrent access per
/// key treat [`remove`](Cache::remove) as "release the lock on this key" and
/// [`put`](Cache::put) as "publish the value and release the lock".
///
/// # Example
///
/// ```
/// use txn_cache::backend::{Cache, InMemoryCache, Lookup};
///
/// let cache = InMemoryCache::<String, u32>::new("users");
/// cache.put("a".to_string(), Some(1)).unwrap();
/// assert_eq!(cache.get(&"a".to_string()).unwrap(), Lookup::Hit(1));
/// ```
pub trait Cache<K, V>: Send + Sync {
    /// Stable region identifier.
    fn id(&self) -> &str;

    /// Insert or overwrite. `None` stores a verified miss.
    ///
    /// # Errors
    /// Returns `Err` if the store cannot accept the entry.
    fn put(&self, key: K, value: Option<V>) -> Result<()>;

    /// Look up `key`.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable or the entry is corrupt.
    fn get(&self, key: &K) -> Result<Lookup<V>>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` only on store-level failure.
    fn remove(&self, key: &K) -> Result<()>;

    /// Remove every entry of the region.
    ///
    /// # Errors
    /// Returns `Err` only on store-level failure.
    fn clear(&self) -> Result<()>;

    /// Advisory entry count.
    fn size(&self) -> usize;
}

impl<K, V, C> Cache<K, V> for Box<C>
where
    C: Cache<K, V> + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        (**self).get(key)
    }

    fn remove(&self, key: &K) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}

impl<K, V, C> Cache<K, V> for Arc<C>
where
    C: Cache<K, V> + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    fn put(&self, key: K, value: Option<V>) -> Result<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> Result<Lookup<V>> {
        (**self).get(key)
    }

    fn remove(&self, key: &K) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}
