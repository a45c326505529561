//! Merkle tree over ordered leaf payloads
//!
//! # Design
//!
//! - Leaf digest: SHA-256 of the leaf's canonical encoding
//! - Internal digest: SHA-256(left digest || right digest)
//! - Levels are paired left-to-right, bottom-up
//! - Odd level: the unmatched trailing node is promoted unchanged to the
//!   next level. No node is ever paired with itself.
//! - Nodes own their children exclusively; a built tree is immutable and
//!   can be shared between readers without locking
//!
//! Proofs list sibling digests from leaf to root. Levels where the node on
//! the path was promoted contribute no step.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::config::{Config, MerkleConfig};
use crate::digest::Digest;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tracing::{debug, trace};

/// Encoded size of one proof step: side tag + sibling digest
const PROOF_STEP_LEN: usize = 1 + 32;

/// Hash a pair of child digests (used for internal nodes)
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest::from_bytes(hasher.finalize().into())
}

/// Merkle root of precomputed leaf digests, without keeping the tree
pub fn merkle_root(leaves: &[Digest]) -> Result<Digest> {
    if leaves.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut current_level = leaves.to_vec();
    while current_level.len() > 1 {
        current_level = current_level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => hash_pair(left, right),
                // Promote the unmatched node
                _ => pair[0],
            })
            .collect();
    }

    Ok(current_level[0])
}

/// Recompute a root from a leaf digest and its leaf-to-root path
pub fn compute_root(leaf: Digest, path: &[ProofStep]) -> Digest {
    path.iter().fold(leaf, |current, step| match step.side {
        Side::Left => hash_pair(&step.sibling, &current),
        Side::Right => hash_pair(&current, &step.sibling),
    })
}

/// Side of the sibling in a proof step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Sibling is on the left
    Left,
    /// Sibling is on the right
    Right,
}

impl Side {
    fn tag(self) -> u8 {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Side::Left),
            1 => Ok(Side::Right),
            other => Err(Error::InvalidFormat(format!("unknown proof side tag {}", other))),
        }
    }
}

/// One level of a Merkle proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling digest at this level
    pub sibling: Digest,
    /// Which side the sibling sits on
    pub side: Side,
}

/// Merkle inclusion proof (path from leaf to root)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Position of the leaf in the original sequence
    pub leaf_index: usize,
    /// Leaf digest being proven
    pub leaf: Digest,
    /// Sibling steps, leaf first
    pub path: Vec<ProofStep>,
    /// Expected root digest
    pub root: Digest,
}

impl MerkleProof {
    /// Root implied by the leaf and path
    pub fn compute_root(&self) -> Digest {
        compute_root(self.leaf, &self.path)
    }

    /// Verify the path leads from the leaf to the root
    pub fn verify(&self) -> bool {
        self.compute_root() == self.root
    }

    /// Verify a claimed leaf payload against this proof
    pub fn verify_payload<T: Encode + ?Sized>(&self, payload: &T) -> bool {
        Digest::of_value(payload) == self.leaf && self.verify()
    }
}

impl Encode for MerkleProof {
    fn encode(&self, out: &mut ByteWriter) {
        out.write_u64(self.leaf_index as u64);
        self.leaf.encode(out);
        self.root.encode(out);
        out.write_u32(self.path.len() as u32);
        for step in &self.path {
            out.write_u8(step.side.tag());
            step.sibling.encode(out);
        }
    }
}

impl Decode for MerkleProof {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self> {
        let leaf_index = reader.read_u64()?;
        let leaf_index = usize::try_from(leaf_index)
            .map_err(|_| Error::InvalidFormat(format!("leaf index {} too large", leaf_index)))?;
        let leaf = Digest::decode(reader)?;
        let root = Digest::decode(reader)?;

        let count = reader.read_u32()? as usize;
        // Never trust the count for allocation beyond what the input can hold
        let mut path = Vec::with_capacity(count.min(reader.remaining() / PROOF_STEP_LEN));
        for _ in 0..count {
            let side = Side::from_tag(reader.read_u8()?)?;
            let sibling = Digest::decode(reader)?;
            path.push(ProofStep { sibling, side });
        }

        Ok(Self {
            leaf_index,
            leaf,
            path,
            root,
        })
    }
}

/// Merkle tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerkleNode {
    /// Digest of one leaf payload
    Leaf {
        /// Leaf digest
        digest: Digest,
    },
    /// Digest of two owned children
    Internal {
        /// SHA-256(left.digest || right.digest)
        digest: Digest,
        /// Leaves under this node
        leaf_count: usize,
        /// Left child
        left: Box<MerkleNode>,
        /// Right child
        right: Box<MerkleNode>,
    },
}

impl MerkleNode {
    /// Create leaf node
    pub fn leaf(digest: Digest) -> Self {
        MerkleNode::Leaf { digest }
    }

    /// Create internal node, taking ownership of both children
    fn internal(left: MerkleNode, right: MerkleNode) -> Self {
        MerkleNode::Internal {
            digest: hash_pair(&left.digest(), &right.digest()),
            leaf_count: left.leaf_count() + right.leaf_count(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Node digest
    pub fn digest(&self) -> Digest {
        match self {
            MerkleNode::Leaf { digest } | MerkleNode::Internal { digest, .. } => *digest,
        }
    }

    /// Leaves under this node
    pub fn leaf_count(&self) -> usize {
        match self {
            MerkleNode::Leaf { .. } => 1,
            MerkleNode::Internal { leaf_count, .. } => *leaf_count,
        }
    }

    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, MerkleNode::Leaf { .. })
    }

    /// Children of an internal node
    pub fn children(&self) -> Option<(&MerkleNode, &MerkleNode)> {
        match self {
            MerkleNode::Leaf { .. } => None,
            MerkleNode::Internal { left, right, .. } => Some((left, right)),
        }
    }

    /// Edges on the longest path down to a leaf
    pub fn height(&self) -> usize {
        match self.children() {
            None => 0,
            Some((left, right)) => 1 + left.height().max(right.height()),
        }
    }
}

/// Builds trees according to a [`MerkleConfig`]
#[derive(Debug, Clone)]
pub struct MerkleBuilder {
    config: MerkleConfig,
    short_digest_bytes: usize,
}

impl Default for MerkleBuilder {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl MerkleBuilder {
    /// Create builder from Merkle settings
    pub fn new(config: MerkleConfig) -> Self {
        Self {
            config,
            short_digest_bytes: Config::default().display.short_digest_bytes,
        }
    }

    /// Create builder from the full configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            config: config.merkle.clone(),
            short_digest_bytes: config.display.short_digest_bytes,
        }
    }

    /// Active Merkle settings
    pub fn config(&self) -> &MerkleConfig {
        &self.config
    }

    /// Encode and hash every leaf, then build the tree
    pub fn build<T: Encode + Sync>(&self, leaves: &[T]) -> Result<MerkleTree> {
        if leaves.is_empty() {
            return Err(Error::EmptyInput);
        }
        let digests = self.hash_leaves(leaves);
        self.build_from_digests(digests)
    }

    /// Split `data` into `chunk_size` pieces and build over the chunks
    pub fn build_chunked(&self, data: &[u8]) -> Result<MerkleTree> {
        if self.config.chunk_size == 0 {
            return Err(Error::Config("merkle.chunk_size must be > 0".into()));
        }
        let chunks: Vec<&[u8]> = data.chunks(self.config.chunk_size).collect();
        trace!(
            bytes = data.len(),
            chunk_size = self.config.chunk_size,
            chunks = chunks.len(),
            "split payload into chunks"
        );
        self.build(&chunks)
    }

    /// Build from precomputed leaf digests
    pub fn build_from_digests(&self, digests: Vec<Digest>) -> Result<MerkleTree> {
        if digests.is_empty() {
            return Err(Error::EmptyInput);
        }

        let leaf_count = digests.len();
        let mut level: Vec<MerkleNode> = digests.into_iter().map(MerkleNode::leaf).collect();

        while level.len() > 1 {
            let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
            let mut nodes = level.into_iter();
            while let Some(left) = nodes.next() {
                match nodes.next() {
                    Some(right) => next_level.push(MerkleNode::internal(left, right)),
                    // Odd count: promote the trailing node
                    None => next_level.push(left),
                }
            }
            level = next_level;
        }

        let root = level.pop().ok_or(Error::EmptyInput)?;
        let tree = MerkleTree { root };

        debug!(
            leaves = leaf_count,
            depth = tree.depth(),
            root = %tree.root_digest().to_hex_prefix(self.short_digest_bytes),
            "built merkle tree"
        );
        Ok(tree)
    }

    fn hash_leaves<T: Encode + Sync>(&self, leaves: &[T]) -> Vec<Digest> {
        #[cfg(feature = "parallel")]
        let digests: Vec<Digest> = if self.config.parallel_leaf_hashing
            && leaves.len() >= self.config.parallel_threshold
        {
            use rayon::prelude::*;
            // collect() on an indexed parallel iterator keeps input order
            leaves.par_iter().map(|leaf| Digest::of_value(leaf)).collect()
        } else {
            leaves.iter().map(|leaf| Digest::of_value(leaf)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let digests: Vec<Digest> = leaves.iter().map(|leaf| Digest::of_value(leaf)).collect();

        digests
    }
}

/// Immutable Merkle tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    root: MerkleNode,
}

impl MerkleTree {
    /// Build a tree over the canonical encodings of `leaves`
    pub fn build<T: Encode + Sync>(leaves: &[T]) -> Result<Self> {
        MerkleBuilder::default().build(leaves)
    }

    /// Build a tree from precomputed leaf digests
    pub fn from_leaf_digests(digests: Vec<Digest>) -> Result<Self> {
        MerkleBuilder::default().build_from_digests(digests)
    }

    /// Build a tree over `chunk_size`-byte chunks of `data`
    pub fn from_chunks(data: &[u8], chunk_size: usize) -> Result<Self> {
        let config = MerkleConfig {
            chunk_size,
            ..MerkleConfig::default()
        };
        MerkleBuilder::new(config).build_chunked(data)
    }

    /// Root node
    pub fn root(&self) -> &MerkleNode {
        &self.root
    }

    /// Root digest
    pub fn root_digest(&self) -> Digest {
        self.root.digest()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Edges from the root to the deepest leaf
    pub fn depth(&self) -> usize {
        self.root.height()
    }

    /// Leaf digests in original order
    pub fn leaf_digests(&self) -> Vec<Digest> {
        let mut out = Vec::with_capacity(self.leaf_count());
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node.children() {
                None => out.push(node.digest()),
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out
    }

    /// Generate Merkle proof for the leaf at `leaf_index`
    pub fn proof_for(&self, leaf_index: usize) -> Result<MerkleProof> {
        let len = self.leaf_count();
        if leaf_index >= len {
            return Err(Error::IndexOutOfRange {
                index: leaf_index,
                len,
            });
        }

        // Walk down from the root, recording the sibling at each branch
        let mut path = Vec::new();
        let mut node = &self.root;
        let mut offset = leaf_index;
        while let Some((left, right)) = node.children() {
            let left_count = left.leaf_count();
            if offset < left_count {
                path.push(ProofStep {
                    sibling: right.digest(),
                    side: Side::Right,
                });
                node = left;
            } else {
                path.push(ProofStep {
                    sibling: left.digest(),
                    side: Side::Left,
                });
                offset -= left_count;
                node = right;
            }
        }
        path.reverse();

        trace!(leaf_index, steps = path.len(), "generated merkle proof");
        Ok(MerkleProof {
            leaf_index,
            leaf: node.digest(),
            path,
            root: self.root_digest(),
        })
    }

    /// Verify that `leaf` sits at `leaf_index` in this tree
    pub fn verify_leaf(&self, leaf_index: usize, leaf: &Digest) -> bool {
        match self.proof_for(leaf_index) {
            Ok(proof) => proof.leaf == *leaf && proof.verify(),
            Err(_) => false,
        }
    }
}
