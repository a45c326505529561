use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use integrity_core::{config::MerkleConfig, MerkleBuilder, MerkleTree};

const LEAF_BYTES: usize = 256;

fn make_leaves(count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| {
            (0..LEAF_BYTES)
                .map(|j| ((i * LEAF_BYTES + j) % 251) as u8)
                .collect()
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let sequential = MerkleBuilder::new(MerkleConfig {
        parallel_leaf_hashing: false,
        ..MerkleConfig::default()
    });
    let parallel = MerkleBuilder::new(MerkleConfig {
        parallel_leaf_hashing: true,
        parallel_threshold: 1,
        ..MerkleConfig::default()
    });

    for &size in &[1024usize, 16_384, 65_536] {
        let leaves = make_leaves(size);
        let mut group = c.benchmark_group("build");
        group.throughput(Throughput::Bytes((size * LEAF_BYTES) as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &leaves, |b, leaves| {
            b.iter(|| sequential.build(black_box(leaves)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &leaves, |b, leaves| {
            b.iter(|| parallel.build(black_box(leaves)).unwrap());
        });
        group.finish();
    }
}

fn bench_proofs(c: &mut Criterion) {
    let leaves = make_leaves(16_384);
    let tree = MerkleTree::build(&leaves).unwrap();
    let mut group = c.benchmark_group("proof");
    group.bench_function("proof_for", |b| {
        b.iter(|| tree.proof_for(black_box(12_345)).unwrap());
    });
    let proof = tree.proof_for(12_345).unwrap();
    group.bench_function("verify", |b| {
        b.iter(|| black_box(&proof).verify());
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_proofs);
criterion_main!(benches);
