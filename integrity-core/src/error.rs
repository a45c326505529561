//! Error types for the integrity core

use thiserror::Error;

/// Result type for integrity operations
pub type Result<T> = std::result::Result<T, Error>;

/// Integrity errors
#[derive(Error, Debug)]
pub enum Error {
    /// Decode attempted past the available bytes
    #[error("Underflow: needed {needed} bytes, {remaining} remaining")]
    Underflow {
        /// Bytes the value required
        needed: usize,
        /// Bytes left in the source
        remaining: usize,
    },

    /// Malformed hexadecimal or otherwise undecodable input
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Merkle tree build called with zero leaves
    #[error("Empty input: a Merkle tree needs at least one leaf")]
    EmptyInput,

    /// Proof requested for a leaf the tree does not have
    #[error("Leaf index {index} out of range for {len} leaves")]
    IndexOutOfRange {
        /// Requested leaf index
        index: usize,
        /// Number of leaves in the tree
        len: usize,
    },

    /// Update or finalize on an already finalized digest engine
    #[error("Digest engine misuse: {0}")]
    EngineMisuse(&'static str),

    /// The hash primitive reported an internal failure
    #[error("Computation fault: {0}")]
    ComputationFault(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error means the hash primitive itself can no longer be
    /// trusted. Every other error is recoverable at the call site.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ComputationFault(_))
    }
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Self {
        Error::InvalidFormat(err.to_string())
    }
}
