//! SHA-256 digest engine
//!
//! [`Hash256`] is a single-use engine: it accepts any number of updates,
//! produces exactly one [`Digest`], and rejects every call after that with
//! [`Error::EngineMisuse`] while keeping the computed digest intact.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::uint::U256;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;
use tracing::{error, warn};

/// Digest length in bytes
pub const DIGEST_LEN: usize = 32;

/// Largest message SHA-256 accepts: 2^64 - 1 bits
const MAX_MESSAGE_BYTES: u64 = (1 << 61) - 1;

/// Finalized SHA-256 output
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// All-zero digest
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    /// Hash a complete byte sequence in one step
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Hash the canonical encoding of a value
    pub fn of_value<T: Encode + ?Sized>(value: &T) -> Self {
        Self::of(&value.to_canonical_bytes())
    }

    /// Wrap a precomputed hash
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex of all 32 bytes
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Lowercase hex of the first `num_bytes` bytes
    pub fn to_hex_prefix(&self, num_bytes: usize) -> String {
        hex::encode(&self.0[..num_bytes.min(DIGEST_LEN)])
    }

    /// Abbreviated hex (first 4 bytes)
    pub fn short_hex(&self) -> String {
        self.to_hex_prefix(4)
    }

    /// Parse 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != DIGEST_LEN * 2 {
            return Err(Error::InvalidFormat(format!(
                "digest hex must be {} characters, got {}",
                DIGEST_LEN * 2,
                s.len()
            )));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Interpret the digest as a big-endian 256-bit number
    pub fn to_uint(&self) -> U256 {
        U256::from_be_bytes(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Digest> for [u8; DIGEST_LEN] {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Encode for Digest {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_bytes(&self.0);
    }
}

impl Decode for Digest {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self(reader.read_array()?))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Engine state
enum EngineState {
    /// Accepting input
    Open(Sha256),
    /// Digest computed; no further input
    Finalized(Digest),
}

/// Incremental, finalize-once SHA-256 engine
pub struct Hash256 {
    state: EngineState,
    absorbed: u64,
}

impl Hash256 {
    /// Create an open engine
    pub fn new() -> Self {
        Self {
            state: EngineState::Open(Sha256::new()),
            absorbed: 0,
        }
    }

    /// Fold bytes into the running hash
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        let hasher = match &mut self.state {
            EngineState::Open(hasher) => hasher,
            EngineState::Finalized(_) => {
                warn!(len = data.len(), "update on finalized digest engine");
                return Err(Error::EngineMisuse("update after finalize"));
            }
        };

        let total = self
            .absorbed
            .checked_add(data.len() as u64)
            .filter(|total| *total <= MAX_MESSAGE_BYTES);
        let Some(total) = total else {
            error!(
                absorbed = self.absorbed,
                len = data.len(),
                "SHA-256 message length limit exceeded"
            );
            return Err(Error::ComputationFault(format!(
                "message length exceeds {} bytes",
                MAX_MESSAGE_BYTES
            )));
        };

        hasher.update(data);
        self.absorbed = total;
        Ok(())
    }

    /// Fold the canonical encoding of a value into the running hash
    pub fn absorb<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.update(&value.to_canonical_bytes())
    }

    /// Compute the digest of everything absorbed so far.
    ///
    /// Succeeds once; later calls fail with [`Error::EngineMisuse`].
    pub fn finalize(&mut self) -> Result<Digest> {
        let digest = match &mut self.state {
            EngineState::Open(hasher) => Digest(std::mem::take(hasher).finalize().into()),
            EngineState::Finalized(_) => {
                warn!("finalize on finalized digest engine");
                return Err(Error::EngineMisuse("finalize after finalize"));
            }
        };
        self.state = EngineState::Finalized(digest);
        Ok(digest)
    }

    /// Check if the engine has produced its digest
    pub fn is_finalized(&self) -> bool {
        matches!(self.state, EngineState::Finalized(_))
    }

    /// Total bytes folded in
    pub fn bytes_absorbed(&self) -> u64 {
        self.absorbed
    }

    /// Digest computed by [`Hash256::finalize`], if any
    pub fn result(&self) -> Option<Digest> {
        match self.state {
            EngineState::Finalized(digest) => Some(digest),
            EngineState::Open(_) => None,
        }
    }
}

impl Default for Hash256 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hash256")
            .field("finalized", &self.is_finalized())
            .field("absorbed", &self.absorbed)
            .finish()
    }
}
