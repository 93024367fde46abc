use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tocc_store::store::Store;

/// Builds a store with one key whose chain already holds `depth` committed
/// versions, so `read`/`write` have to scan that far to find the visible one.
fn store_with_chain_depth(depth: u64) -> Store {
    let store = Store::new();
    store.seed(1).unwrap();
    for ts in 1..=depth {
        store.read(1, ts).unwrap();
        store.write(1, ts as i64, ts).unwrap().unwrap();
    }
    store
}

fn bench_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_read");
    for depth in [1u64, 8, 64, 512] {
        let store = store_with_chain_depth(depth);
        group.bench_with_input(BenchmarkId::new("visible_version", depth), &depth, |b, _| {
            b.iter(|| store.read(black_box(1), black_box(depth + 1)).unwrap());
        });
    }
    group.finish();
}

fn bench_write_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_write_append");
    for depth in [1u64, 8, 64, 512] {
        group.bench_with_input(BenchmarkId::new("w3_append", depth), &depth, |b, _| {
            b.iter_batched(
                || store_with_chain_depth(depth),
                |store| {
                    store.read(1, depth + 1).unwrap();
                    store.write(black_box(1), black_box(99), depth + 1).unwrap().unwrap();
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_seed(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_seed");
    for keys in [10u32, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("seed", keys), &keys, |b, &keys| {
            b.iter(|| {
                let store = Store::new();
                store.seed(black_box(keys)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_read, bench_write_append, bench_seed);
criterion_main!(benches);
