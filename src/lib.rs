//! # txn-cache
//!
//! A transaction-aware result cache for Rust.
//!
//! ## Features
//!
//! - **Composite Keys:** `CacheKey` folds every input of an operation into one
//!   order-sensitive, deterministic identity
//! - **Transactional Buffering:** writes and clears are staged per unit of work
//!   and published only on commit; rollback publishes nothing
//! - **Decorated Stores:** blocking, scheduled flush, serialized copies and
//!   hit-ratio logging layered over any `Cache` implementation
//! - **Per-Call Strategies:** Fresh, Refresh, Invalidate and Bypass
//!
//! ## Quick Start
//!
//! ```
//! use txn_cache::{CacheBuilder, CacheKeyBuilder, CacheStrategy, CachingExecutor};
//!
//! // 1. Build a region
//! let users = CacheBuilder::new("UserMapper")
//!     .build::<_, Option<String>>()
//!     .unwrap();
//!
//! // 2. Describe the operation
//! let key = CacheKeyBuilder::statement("UserMapper.selectName")
//!     .sql("SELECT name FROM users WHERE id = ?")
//!     .param(42)
//!     .build();
//!
//! // 3. Run it inside a unit of work
//! let mut executor = CachingExecutor::new();
//! let name = executor
//!     .query(&users, &key, CacheStrategy::Refresh, || Ok(Some("alice".to_string())))
//!     .unwrap();
//! executor.commit().unwrap();
//!
//! assert_eq!(name, Some(Some("alice".to_string())));
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod key;
pub mod manager;
pub mod observability;
pub mod param;
pub mod serialization;
pub mod strategy;
pub mod transactional;

// Re-exports for convenience
pub use backend::{Cache, Lookup};
pub use builder::CacheBuilder;
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use executor::CachingExecutor;
pub use key::{CacheKey, CacheKeyBuilder};
pub use manager::TransactionalCacheManager;
pub use observability::{CacheMetrics, NoOpMetrics};
pub use param::KeyPart;
pub use strategy::CacheStrategy;
pub use transactional::{ReadPolicy, TransactionalCache};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
