//! Node values and the injected combine capability.
//!
//! Every node value is a 256-bit unsigned integer stored as 32 big-endian
//! bytes. Combiners always see both operands as full 32-byte words, so
//! small values are zero-padded on the left before hashing.

use std::{fmt, str::FromStr};

use bincode::{Decode, Encode};

use crate::MerkleError;

/// Width of a node value in bytes.
pub const HASH_SIZE: usize = 32;

/// A 256-bit unsigned integer used for leaf and node values.
///
/// Bytes are big-endian, so the derived ordering is numeric ordering.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct HashValue([u8; HASH_SIZE]);

impl HashValue {
    /// The all-zero value.
    pub const ZERO: HashValue = HashValue([0u8; HASH_SIZE]);

    /// Build a value from up to 32 big-endian bytes, zero-padding on the
    /// left.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Self, MerkleError> {
        if bytes.len() > HASH_SIZE {
            return Err(MerkleError::InvalidInput(format!(
                "hash value is {} bytes, at most {} allowed",
                bytes.len(),
                HASH_SIZE
            )));
        }
        let mut out = [0u8; HASH_SIZE];
        out[HASH_SIZE - bytes.len()..].copy_from_slice(bytes);
        Ok(HashValue(out))
    }

    /// The raw big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// A copy of the big-endian bytes.
    pub fn to_be_bytes(self) -> [u8; HASH_SIZE] {
        self.0
    }

    /// The least significant 64 bits.
    pub fn low_u64(&self) -> u64 {
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[HASH_SIZE - 8..]);
        u64::from_be_bytes(low)
    }
}

impl From<[u8; HASH_SIZE]> for HashValue {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        HashValue(bytes)
    }
}

impl From<u64> for HashValue {
    fn from(value: u64) -> Self {
        let mut out = [0u8; HASH_SIZE];
        out[HASH_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        HashValue(out)
    }
}

impl FromStr for HashValue {
    type Err = MerkleError;

    /// Parse a hex string, with or without a `0x` prefix. Short inputs are
    /// zero-padded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let padded = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&padded)
            .map_err(|e| MerkleError::InvalidInput(format!("bad hex value {:?}: {}", s, e)))?;
        HashValue::from_be_slice(&bytes)
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::LowerHex for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue({})", self)
    }
}

/// Order-sensitive function deriving a parent value from its two children.
///
/// The tree never picks a hash algorithm itself; callers inject one. Any
/// `Fn(&HashValue, &HashValue) -> HashValue` closure is a combiner.
pub trait Combine {
    /// Combine a left and a right child into their parent.
    fn combine(&self, left: &HashValue, right: &HashValue) -> HashValue;
}

impl<F> Combine for F
where
    F: Fn(&HashValue, &HashValue) -> HashValue,
{
    fn combine(&self, left: &HashValue, right: &HashValue) -> HashValue {
        self(left, right)
    }
}

/// Domain tag prepended to Blake3 merge inputs.
#[cfg(feature = "blake3")]
const INTERNAL_TAG: u8 = 0x01;

/// `blake3(0x01 || left || right)`.
#[cfg(feature = "blake3")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Combine;

#[cfg(feature = "blake3")]
impl Combine for Blake3Combine {
    fn combine(&self, left: &HashValue, right: &HashValue) -> HashValue {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[INTERNAL_TAG]);
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        HashValue(*hasher.finalize().as_bytes())
    }
}

/// `sha256(left || right)`.
#[cfg(feature = "sha256")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Combine;

#[cfg(feature = "sha256")]
impl Combine for Sha256Combine {
    fn combine(&self, left: &HashValue, right: &HashValue) -> HashValue {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        HashValue(hasher.finalize().into())
    }
}
