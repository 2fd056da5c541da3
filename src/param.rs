//! Dynamically typed values folded into a [`CacheKey`](crate::key::CacheKey).
//!
//! A cached operation is identified by an ordered list of heterogeneous
//! arguments (statement id, bounds, bound parameters). `KeyPart` carries one
//! such argument with content-based hashing and equality, so two keys built
//! from equal arguments match even when the arguments are nested lists.

use std::fmt;

/// Canonical bit pattern used for every NaN so that NaN parts compare equal.
const CANONICAL_NAN_BITS: u64 = 0x7ff8_0000_0000_0000;

/// One argument contributing to a composite cache key.
#[derive(Debug, Clone)]
pub enum KeyPart {
    Null,
    Bool(bool),
    /// Every integer that fits in an `i64`.
    Int(i64),
    /// Unsigned values above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<KeyPart>),
}

impl KeyPart {
    /// Deterministic 32-bit content hash.
    ///
    /// Stable across processes and platforms: strings hash their UTF-16 code
    /// units, sequences use the `31 * h + element` fold.
    pub fn hash_code(&self) -> i32 {
        match self {
            KeyPart::Null => 0,
            KeyPart::Bool(true) => 1231,
            KeyPart::Bool(false) => 1237,
            KeyPart::Int(v) => fold_long(*v as u64),
            KeyPart::UInt(v) => fold_long(*v),
            KeyPart::Float(v) => fold_long(canonical_bits(*v)),
            KeyPart::Str(s) => s
                .encode_utf16()
                .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32)),
            KeyPart::Bytes(bytes) => bytes.iter().fold(1i32, |h, b| {
                h.wrapping_mul(31).wrapping_add(*b as i8 as i32)
            }),
            KeyPart::List(items) => items.iter().fold(1i32, |h, item| {
                h.wrapping_mul(31).wrapping_add(item.hash_code())
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, KeyPart::Null)
    }
}

fn fold_long(bits: u64) -> i32 {
    (bits ^ (bits >> 32)) as i32
}

fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        CANONICAL_NAN_BITS
    } else {
        v.to_bits()
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyPart::Null, KeyPart::Null) => true,
            (KeyPart::Bool(a), KeyPart::Bool(b)) => a == b,
            (KeyPart::Int(a), KeyPart::Int(b)) => a == b,
            (KeyPart::UInt(a), KeyPart::UInt(b)) => a == b,
            (KeyPart::Float(a), KeyPart::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (KeyPart::Str(a), KeyPart::Str(b)) => a == b,
            (KeyPart::Bytes(a), KeyPart::Bytes(b)) => a == b,
            (KeyPart::List(a), KeyPart::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyPart {}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Null => write!(f, "null"),
            KeyPart::Bool(v) => write!(f, "{}", v),
            KeyPart::Int(v) => write!(f, "{}", v),
            KeyPart::UInt(v) => write!(f, "{}", v),
            KeyPart::Float(v) => write!(f, "{:?}", v),
            KeyPart::Str(s) => write!(f, "{}", s),
            KeyPart::Bytes(bytes) => {
                write!(f, "[")?;
                for (i, b) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", *b as i8)?;
                }
                write!(f, "]")
            }
            KeyPart::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for KeyPart {
                fn from(v: $t) -> Self {
                    KeyPart::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, isize, u8, u16, u32);

macro_rules! impl_from_wide_uint {
    ($($t:ty),*) => {
        $(
            impl From<$t> for KeyPart {
                fn from(v: $t) -> Self {
                    match i64::try_from(v) {
                        Ok(v) => KeyPart::Int(v),
                        Err(_) => KeyPart::UInt(v as u64),
                    }
                }
            }
        )*
    };
}

impl_from_wide_uint!(u64, usize);

impl From<bool> for KeyPart {
    fn from(v: bool) -> Self {
        KeyPart::Bool(v)
    }
}

impl From<f32> for KeyPart {
    fn from(v: f32) -> Self {
        KeyPart::Float(v as f64)
    }
}

impl From<f64> for KeyPart {
    fn from(v: f64) -> Self {
        KeyPart::Float(v)
    }
}

impl From<&str> for KeyPart {
    fn from(v: &str) -> Self {
        KeyPart::Str(v.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(v: String) -> Self {
        KeyPart::Str(v)
    }
}

impl From<&String> for KeyPart {
    fn from(v: &String) -> Self {
        KeyPart::Str(v.clone())
    }
}

impl From<&[u8]> for KeyPart {
    fn from(v: &[u8]) -> Self {
        KeyPart::Bytes(v.to_vec())
    }
}

impl<T: Into<KeyPart>> From<Vec<T>> for KeyPart {
    fn from(items: Vec<T>) -> Self {
        KeyPart::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(KeyPart::Null)
    }
}

impl From<()> for KeyPart {
    fn from(_: ()) -> Self {
        KeyPart::Null
    }
}
