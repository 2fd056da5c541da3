//! Per-call cache strategies.

use std::fmt;
use std::str::FromStr;

/// How a single cached operation interacts with its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Cache only. A miss returns nothing and the loader is never called.
    Fresh,
    /// Read through: on a miss, run the loader and stage its result.
    #[default]
    Refresh,
    /// Stage a clear of the region, then run the loader and stage its result.
    Invalidate,
    /// Run the loader without touching the region at all.
    Bypass,
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStrategy::Fresh => write!(f, "Fresh"),
            CacheStrategy::Refresh => write!(f, "Refresh"),
            CacheStrategy::Invalidate => write!(f, "Invalidate"),
            CacheStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}

impl FromStr for CacheStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fresh" => Ok(CacheStrategy::Fresh),
            "refresh" => Ok(CacheStrategy::Refresh),
            "invalidate" => Ok(CacheStrategy::Invalidate),
            "bypass" => Ok(CacheStrategy::Bypass),
            _ => Err(format!("Unknown cache strategy: {}", s)),
        }
    }
}
