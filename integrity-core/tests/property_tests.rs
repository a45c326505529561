//! Property-based tests for integrity invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Codec round-trip: decode(encode(x)) == x for every supported kind
//! - Byte order: integers encode big-endian on every host
//! - Ordering: FixedUint order equals big-endian byte order
//! - Merkle determinism and sensitivity to any single-byte change
//! - Proof completeness: every leaf's proof recomputes the root

use integrity_core::{
    codec::{ByteReader, ByteWriter, Decode, Encode, Prefixed},
    Digest, FixedUint, Hash256, MerkleProof, MerkleTree,
};
use proptest::prelude::*;

/// Strategy for generating leaf payloads
fn leaves_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..64), 1..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: every integer width round-trips
    #[test]
    fn prop_integer_roundtrip(a in any::<u8>(), b in any::<u16>(), c in any::<u32>(), d in any::<u64>()) {
        prop_assert_eq!(u8::from_canonical_bytes(&a.to_canonical_bytes()).unwrap(), a);
        prop_assert_eq!(u16::from_canonical_bytes(&b.to_canonical_bytes()).unwrap(), b);
        prop_assert_eq!(u32::from_canonical_bytes(&c.to_canonical_bytes()).unwrap(), c);
        prop_assert_eq!(u64::from_canonical_bytes(&d.to_canonical_bytes()).unwrap(), d);
    }

    /// Property: integers encode in network order regardless of host
    #[test]
    fn prop_integers_are_big_endian(v in any::<u64>()) {
        prop_assert_eq!(v.to_canonical_bytes(), v.to_be_bytes().to_vec());
        prop_assert_eq!((v as u32).to_canonical_bytes(), (v as u32).to_be_bytes().to_vec());
        prop_assert_eq!((v as u16).to_canonical_bytes(), (v as u16).to_be_bytes().to_vec());
    }

    /// Property: text round-trips, including the empty string
    #[test]
    fn prop_string_roundtrip(s in ".*") {
        let bytes = s.to_canonical_bytes();
        prop_assert_eq!(String::from_canonical_bytes(&bytes).unwrap(), s);
    }

    /// Property: prefixed values can be concatenated and read back in order
    #[test]
    fn prop_prefixed_stream(items in prop::collection::vec(".*", 0..10)) {
        let mut out = ByteWriter::new();
        for item in &items {
            Prefixed(item.clone()).encode(&mut out);
        }
        let bytes = out.into_inner();
        let mut reader = ByteReader::new(&bytes);
        for item in &items {
            let decoded = Prefixed::<String>::decode(&mut reader).unwrap().into_inner();
            prop_assert_eq!(&decoded, item);
        }
        prop_assert!(reader.is_empty());
    }

    /// Property: short input always underflows for fixed-width values
    #[test]
    fn prop_short_input_underflows(bytes in prop::collection::vec(any::<u8>(), 0..8)) {
        let result = u64::from_canonical_bytes(&bytes);
        let is_underflow = matches!(result, Err(integrity_core::Error::Underflow { .. }));
        prop_assert!(is_underflow);
    }

    /// Property: FixedUint ordering is a strict total order matching byte order
    #[test]
    fn prop_fixed_uint_order(a in any::<[u8; 8]>(), b in any::<[u8; 8]>()) {
        let x = FixedUint::<8>::from_be_bytes(a);
        let y = FixedUint::<8>::from_be_bytes(b);
        prop_assert_eq!(x.cmp(&y), a.cmp(&b));
        prop_assert_eq!(x.cmp(&y), u64::from_be_bytes(a).cmp(&u64::from_be_bytes(b)));
        prop_assert_eq!(x == y, y == x);
        prop_assert_eq!(x, x);
        prop_assert_eq!(
            [x < y, x == y, x > y].iter().filter(|held| **held).count(),
            1
        );
    }

    /// Property: FixedUint hex form round-trips to the same bytes
    #[test]
    fn prop_fixed_uint_hex(a in any::<[u8; 16]>()) {
        let hex = hex::encode(a);
        let parsed = FixedUint::<16>::from_hex(&hex).unwrap();
        prop_assert_eq!(parsed.to_bytes(), a);
        prop_assert_eq!(parsed.to_hex(), hex);
    }

    /// Property: splitting input across updates never changes the digest
    #[test]
    fn prop_incremental_digest(data in prop::collection::vec(any::<u8>(), 0..512), split in 0usize..512) {
        let split = split.min(data.len());
        let mut engine = Hash256::new();
        engine.update(&data[..split]).unwrap();
        engine.update(&data[split..]).unwrap();
        prop_assert_eq!(engine.finalize().unwrap(), Digest::of(&data));
    }

    /// Property: Merkle root is deterministic
    #[test]
    fn prop_merkle_root_deterministic(leaves in leaves_strategy()) {
        let tree1 = MerkleTree::build(&leaves).unwrap();
        let tree2 = MerkleTree::build(&leaves).unwrap();
        prop_assert_eq!(tree1.root_digest(), tree2.root_digest());
        prop_assert_eq!(tree1.leaf_count(), leaves.len());
    }

    /// Property: flipping any byte of any leaf changes the root
    #[test]
    fn prop_single_byte_change_changes_root(
        leaves in leaves_strategy(),
        leaf_pick in any::<prop::sample::Index>(),
        byte_pick in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let original = MerkleTree::build(&leaves).unwrap();

        let mut tampered = leaves.clone();
        let leaf = leaf_pick.index(tampered.len());
        let byte = byte_pick.index(tampered[leaf].len());
        tampered[leaf][byte] ^= flip;

        let changed = MerkleTree::build(&tampered).unwrap();
        prop_assert_ne!(original.root_digest(), changed.root_digest());
    }

    /// Property: every leaf's proof recomputes the root
    #[test]
    fn prop_every_proof_verifies(leaves in leaves_strategy()) {
        let tree = MerkleTree::build(&leaves).unwrap();
        for (i, leaf) in leaves.iter().enumerate() {
            let proof = tree.proof_for(i).unwrap();
            prop_assert!(proof.verify_payload(leaf));
            prop_assert_eq!(proof.compute_root(), tree.root_digest());

            let decoded = MerkleProof::from_canonical_bytes(&proof.to_canonical_bytes()).unwrap();
            prop_assert_eq!(decoded, proof);
        }
    }
}
