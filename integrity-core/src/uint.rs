//! Fixed-width big-endian unsigned integers
//!
//! `FixedUint<N>` stores `N` bytes most-significant first. Because the bytes
//! are big-endian, lexicographic byte order is numeric order, so the derived
//! `Ord` compares values numerically. The width is a const parameter: values
//! of different widths are different types and cannot be compared.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::digest::Digest;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `N`-byte big-endian unsigned integer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedUint<const N: usize>([u8; N]);

/// 256-bit integer, the width of a SHA-256 digest
pub type U256 = FixedUint<32>;

impl<const N: usize> FixedUint<N> {
    /// Width in bytes
    pub const WIDTH: usize = N;

    /// Create from big-endian bytes
    pub const fn from_be_bytes(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly `N` bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; N] = bytes.try_into().map_err(|_| {
            Error::InvalidFormat(format!("expected {} bytes, got {}", N, bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Parse exactly `2 * N` hex characters, most-significant byte first
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != N * 2 {
            return Err(Error::InvalidFormat(format!(
                "expected {} hex characters, got {}",
                N * 2,
                s.len()
            )));
        }
        let mut bytes = [0u8; N];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Create from a `u64`, left-padding with zeros.
    ///
    /// Fails if the value needs more than `N` bytes.
    pub fn from_u64(value: u64) -> Result<Self> {
        let be = value.to_be_bytes();
        let mut bytes = [0u8; N];
        if N >= be.len() {
            bytes[N - be.len()..].copy_from_slice(&be);
        } else {
            let (high, low) = be.split_at(be.len() - N);
            if high.iter().any(|b| *b != 0) {
                return Err(Error::InvalidFormat(format!(
                    "{} does not fit in {} bytes",
                    value, N
                )));
            }
            bytes.copy_from_slice(low);
        }
        Ok(Self(bytes))
    }

    /// Zero
    pub const fn zero() -> Self {
        Self([0u8; N])
    }

    /// Largest representable value
    pub const fn max_value() -> Self {
        Self([0xff; N])
    }

    /// Check if every byte is zero
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Big-endian bytes
    pub fn to_bytes(&self) -> [u8; N] {
        self.0
    }

    /// Borrow the big-endian bytes
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Lowercase hex, `2 * N` characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Number of zero bits above the most significant set bit
    pub fn leading_zero_bits(&self) -> u32 {
        let mut bits = 0;
        for byte in &self.0 {
            if *byte == 0 {
                bits += 8;
            } else {
                return bits + byte.leading_zeros();
            }
        }
        bits
    }

    /// Threshold check: `self <= target`
    pub fn meets_target(&self, target: &Self) -> bool {
        self <= target
    }
}

impl<const N: usize> Default for FixedUint<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> fmt::Debug for FixedUint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedUint<{}>({})", N, self.to_hex())
    }
}

impl<const N: usize> fmt::Display for FixedUint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize> fmt::LowerHex for FixedUint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize> FromStr for FixedUint<N> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl<const N: usize> From<[u8; N]> for FixedUint<N> {
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes)
    }
}

impl From<Digest> for U256 {
    fn from(digest: Digest) -> Self {
        digest.to_uint()
    }
}

impl<const N: usize> Encode for FixedUint<N> {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(&self.0);
    }
}

impl<const N: usize> Decode for FixedUint<N> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self(reader.read_array()?))
    }
}

impl<const N: usize> Serialize for FixedUint<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de, const N: usize> Deserialize<'de> for FixedUint<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
