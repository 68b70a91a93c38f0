//! Deterministic hash identity for type shapes and overload signatures.
//!
//! [`TypeHash`] is a 64-bit hash computed from names and parameter lists.
//! The overload registry keys its entries by signature hash so that
//! registering the same signature twice is detected without comparing
//! shapes structurally.
//!
//! # Examples
//!
//! ```
//! use strata_core::TypeHash;
//!
//! let a = TypeHash::from_function("+", &[TypeHash::from_name("Int32")]);
//! let b = TypeHash::from_function("+", &[TypeHash::from_name("Int64")]);
//! assert_ne!(a, b);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
pub mod hash_constants {
    /// Separator constant for combining components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for function signature hashes.
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Parameter position mixing constants; parameter order matters.
    pub const PARAM_MARKERS: [u64; 8] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
    ];
}

/// A deterministic 64-bit hash identifying a type shape or a signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash a function name together with its parameter hashes.
    #[inline]
    pub fn from_function(name: &str, param_hashes: &[TypeHash]) -> Self {
        let mut hash = hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0);
        for (i, param) in param_hashes.iter().enumerate() {
            hash = mix(hash, i, param.0);
        }
        TypeHash(hash)
    }

    /// Fold another hash into this one; not commutative.
    #[inline]
    pub fn combine(self, other: TypeHash) -> Self {
        TypeHash(
            self.0
                .wrapping_mul(hash_constants::SEP)
                .wrapping_add(other.0.rotate_left(17)),
        )
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

#[inline]
fn mix(hash: u64, position: usize, param: u64) -> u64 {
    let marker = hash_constants::PARAM_MARKERS
        .get(position)
        .copied()
        .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(position as u64));
    hash.wrapping_mul(hash_constants::SEP)
        .wrapping_add(marker ^ param)
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
