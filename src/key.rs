//! Composite cache keys.
//!
//! A [`CacheKey`] is built by folding an ordered sequence of [`KeyPart`]s into
//! a running hash and checksum while keeping the parts themselves for exact
//! equality. Hash, checksum and count are a fast-path filter; the element-wise
//! comparison is what decides equality.

use crate::param::KeyPart;
use std::fmt;
use std::hash::{Hash, Hasher};

const DEFAULT_MULTIPLIER: i32 = 37;
const DEFAULT_HASHCODE: i32 = 17;

/// Hash contribution of a top-level null part.
const NULL_PART_HASH: i32 = 1;

/// Composite identity for one invocation of a cached operation.
///
/// # Example
///
/// ```
/// use txn_cache::CacheKey;
///
/// let mut a = CacheKey::new();
/// a.update("selectUser");
/// a.update(42);
///
/// let b = CacheKey::from_parts(["selectUser".into(), 42.into()]);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    multiplier: i32,
    hashcode: i32,
    checksum: i64,
    count: i32,
    update_list: Vec<KeyPart>,
    sentinel: bool,
}

impl CacheKey {
    /// Reserved "no key" instance, distinct from an empty key.
    ///
    /// Equal only to itself. Folding parts into it is refused.
    pub const NULL: CacheKey = CacheKey {
        multiplier: DEFAULT_MULTIPLIER,
        hashcode: DEFAULT_HASHCODE,
        checksum: 0,
        count: 0,
        update_list: Vec::new(),
        sentinel: true,
    };

    /// Create an empty key.
    pub fn new() -> Self {
        CacheKey {
            multiplier: DEFAULT_MULTIPLIER,
            hashcode: DEFAULT_HASHCODE,
            checksum: 0,
            count: 0,
            update_list: Vec::new(),
            sentinel: false,
        }
    }

    /// Create a key from an ordered sequence of parts.
    pub fn from_parts<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = KeyPart>,
    {
        let mut key = CacheKey::new();
        key.update_all(parts);
        key
    }

    /// Fold one part into the key.
    ///
    /// The part's hash is weighted by the new element count before being
    /// combined, so the same parts in a different order yield a different key.
    pub fn update(&mut self, part: impl Into<KeyPart>) {
        if self.sentinel {
            warn!("⚠ Refusing to update the null cache key");
            return;
        }

        let part = part.into();
        let mut base_hash = if part.is_null() {
            NULL_PART_HASH
        } else {
            part.hash_code()
        };

        self.count += 1;
        self.checksum += base_hash as i64;
        base_hash = base_hash.wrapping_mul(self.count);

        self.hashcode = self
            .multiplier
            .wrapping_mul(self.hashcode)
            .wrapping_add(base_hash);

        self.update_list.push(part);
    }

    /// Fold every part of `parts` in order. Equivalent to repeated [`update`](Self::update).
    pub fn update_all<I, P>(&mut self, parts: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        for part in parts {
            self.update(part);
        }
    }

    /// Number of parts folded so far.
    pub fn update_count(&self) -> usize {
        self.update_list.len()
    }

    pub fn is_null_key(&self) -> bool {
        self.sentinel
    }

    /// Running combined hash.
    pub fn hash_code(&self) -> i32 {
        self.hashcode
    }

    /// Sum of the per-part hashes.
    pub fn checksum(&self) -> i64 {
        self.checksum
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.update_list
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.sentinel != other.sentinel {
            return false;
        }
        if self.hashcode != other.hashcode {
            return false;
        }
        if self.checksum != other.checksum {
            return false;
        }
        if self.count != other.count {
            return false;
        }
        self.update_list
            .iter()
            .zip(other.update_list.iter())
            .all(|(a, b)| a == b)
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hashcode);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hashcode, self.checksum)?;
        for part in &self.update_list {
            write!(f, ":{}", part)?;
        }
        Ok(())
    }
}

impl<P: Into<KeyPart>> FromIterator<P> for CacheKey {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut key = CacheKey::new();
        key.update_all(iter);
        key
    }
}

impl<P: Into<KeyPart>> Extend<P> for CacheKey {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.update_all(iter);
    }
}

// ============================================================================
// Statement-shaped keys
// ============================================================================

/// Builds keys for paged, parameterised statements.
///
/// Parts are folded in a fixed order: statement id, offset, limit, SQL text,
/// each bound parameter, then the environment id when one is set.
///
/// # Example
///
/// ```
/// use txn_cache::key::CacheKeyBuilder;
///
/// let key = CacheKeyBuilder::statement("UserMapper.selectById")
///     .bounds(0, 10)
///     .sql("SELECT * FROM users WHERE id = ?")
///     .param(7)
///     .build();
///
/// assert_eq!(key.update_count(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    statement_id: String,
    offset: u64,
    limit: u64,
    sql: String,
    params: Vec<KeyPart>,
    environment: Option<String>,
}

impl CacheKeyBuilder {
    /// Unbounded row limit.
    pub const NO_LIMIT: u64 = i32::MAX as u64;

    pub fn statement(statement_id: impl Into<String>) -> Self {
        CacheKeyBuilder {
            statement_id: statement_id.into(),
            offset: 0,
            limit: Self::NO_LIMIT,
            sql: String::new(),
            params: Vec::new(),
            environment: None,
        }
    }

    pub fn bounds(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = sql.into();
        self
    }

    pub fn param(mut self, value: impl Into<KeyPart>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn params<I, P>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        self.params.extend(values.into_iter().map(Into::into));
        self
    }

    /// Tag the key with a database environment so identical statements
    /// against different environments never share entries.
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn build(self) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(self.statement_id);
        key.update(self.offset);
        key.update(self.limit);
        key.update(self.sql);
        key.update_all(self.params);
        if let Some(environment) = self.environment {
            key.update(environment);
        }
        key
    }
}
