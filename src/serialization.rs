//! Versioned envelope for values stored as bytes.
//!
//! # Format
//!
//! ```text
//! [MAGIC: 4 bytes] [VERSION: 4 bytes, little endian] [POSTCARD PAYLOAD]
//! ```
//!
//! The magic rejects bytes that were never written by this crate. The version
//! rejects entries written by an incompatible schema, turning them into misses
//! for the caller instead of silently decoding garbage.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Envelope magic.
pub const CACHE_MAGIC: [u8; 4] = *b"TXCK";

/// Bump when the encoding of cached values changes incompatibly.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encode `value` into an enveloped byte buffer.
///
/// # Errors
/// Returns `Error::SerializationError` if postcard cannot encode the value.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(value)
        .map_err(|e| Error::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&CACHE_MAGIC);
    bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode an enveloped byte buffer.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: buffer too short or bad magic
/// - `Error::VersionMismatch`: written by another schema version
/// - `Error::DeserializationError`: corrupted payload
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidCacheEntry(format!(
            "Entry too short: {} bytes",
            bytes.len()
        )));
    }

    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..4] != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry(format!(
            "Bad magic: {:?}",
            &header[..4]
        )));
    }

    let found = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if found != CURRENT_SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found,
        });
    }

    postcard::from_bytes(payload).map_err(|e| Error::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
    }

    #[test]
    fn test_envelope_header() {
        let bytes = serialize_for_cache(&7u32).expect("serialize failed");
        assert_eq!(&bytes[..4], b"TXCK");
        assert_eq!(&bytes[4..8], &CURRENT_SCHEMA_VERSION.to_le_bytes());
    }

    #[test]
    fn test_roundtrip_rows() {
        let rows = vec![
            Row {
                id: 1,
                name: "alice".to_string(),
            },
            Row {
                id: 2,
                name: "bob".to_string(),
            },
        ];
        let bytes = serialize_for_cache(&rows).expect("serialize failed");
        let decoded: Vec<Row> = deserialize_from_cache(&bytes).expect("deserialize failed");
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let result = deserialize_from_cache::<u32>(b"TXC");
        assert!(matches!(result, Err(Error::InvalidCacheEntry(_))));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = serialize_for_cache(&1u32).expect("serialize failed");
        bytes[0] = b'X';
        let result = deserialize_from_cache::<u32>(&bytes);
        assert!(matches!(result, Err(Error::InvalidCacheEntry(_))));
    }

    #[test]
    fn test_rejects_other_version() {
        let mut bytes = serialize_for_cache(&1u32).expect("serialize failed");
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        let result = deserialize_from_cache::<u32>(&bytes);
        assert_eq!(
            result,
            Err(Error::VersionMismatch {
                expected: CURRENT_SCHEMA_VERSION,
                found: 99
            })
        );
    }

    #[test]
    fn test_rejects_corrupt_payload() {
        let mut bytes = serialize_for_cache(&"hello".to_string()).expect("serialize failed");
        bytes.truncate(HEADER_LEN + 1);
        let result = deserialize_from_cache::<String>(&bytes);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }
}
