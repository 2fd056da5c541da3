//! Error types for cache operations.

use std::fmt;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by stores, decorators and the transactional layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A store rejected or failed an operation.
    BackendError(String),

    /// A value could not be encoded for storage.
    SerializationError(String),

    /// Stored bytes could not be decoded.
    DeserializationError(String),

    /// Stored bytes do not carry a valid envelope.
    InvalidCacheEntry(String),

    /// Stored envelope was written by a different schema version.
    VersionMismatch { expected: u32, found: u32 },

    /// Waiting for a per-key lock exceeded the configured timeout.
    Timeout(String),

    /// Invalid region configuration.
    ConfigError(String),

    /// Invalid input to a cache operation.
    ValidationError(String),

    /// The expensive operation behind the cache failed.
    RepositoryError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Cache backend error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => write!(
                f,
                "Cache schema version mismatch: expected {}, found {}",
                expected, found
            ),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Error::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::SerializationError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}
