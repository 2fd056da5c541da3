//! Metrics hooks for cached operations.

use std::time::Duration;

/// Receives per-operation outcomes from the [`CachingExecutor`](crate::CachingExecutor).
///
/// All methods default to no-ops so implementations only override what they
/// export.
pub trait CacheMetrics: Send + Sync {
    /// The value came from the region (or from this unit of work's staged writes).
    fn record_hit(&self, _region: &str, _duration: Duration) {}

    /// The value had to be loaded.
    fn record_miss(&self, _region: &str, _duration: Duration) {}

    /// The operation failed.
    fn record_error(&self, _region: &str, _error: &str) {}
}

/// Metrics sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {}
