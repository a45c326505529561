//! Ledger Integrity Core
//!
//! Integrity primitives consumed by the ledger and block layers.
//!
//! # Architecture
//!
//! - **Canonical Codec**: big-endian, platform-independent value encoding
//! - **Digest Engine**: incremental SHA-256 with finalize-once semantics
//! - **Fixed-Width Integer**: big-endian numbers for digest/target comparison
//! - **Merkle Tree**: roots and inclusion proofs over ordered leaves
//!
//! # Invariants
//!
//! - Determinism: same logical value → same bytes → same digest, on any host
//! - Finalize once: a digest engine never absorbs input after finalize
//! - Immutability: a built tree is never mutated; rebuild to change leaves
//! - Leaf order: the root depends on leaf order, parallel hashing included

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod codec;
pub mod config;
pub mod digest;
pub mod error;
pub mod merkle;
pub mod uint;

// Re-exports
pub use codec::{ByteReader, ByteWriter, Decode, Encode, Prefixed};
pub use config::Config;
pub use digest::{Digest, Hash256};
pub use error::{Error, Result};
pub use merkle::{MerkleBuilder, MerkleNode, MerkleProof, MerkleTree, ProofStep, Side};
pub use uint::{FixedUint, U256};
