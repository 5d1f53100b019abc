//! Engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use tempfile::TempDir;
use vaultkv_bench::{bench_key, populated_engine, random_data};
use vaultkv_core::{BatchOp, Engine, IteratorOptions, OpenOptions, ReadOptions};

/// Benchmark single puts against stores of increasing size.
///
/// Every put rewrites the whole keyspace, so cost grows with entry count.
fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for entry_count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(entry_count),
            entry_count,
            |b, &count| {
                let engine = populated_engine(count, 64);
                let value = random_data(64);

                b.iter(|| {
                    engine
                        .put(black_box(b"bench-key"), Some(black_box(value.as_slice())))
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark point reads.
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for entry_count in [100, 1000, 10000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(entry_count),
            entry_count,
            |b, &count| {
                let engine = populated_engine(count, 64);
                let options = ReadOptions::default();
                let mut rng = rand::thread_rng();

                b.iter(|| {
                    let key = bench_key(rng.gen_range(0..count));
                    let value = engine.get(black_box(&key), &options).unwrap();
                    black_box(value);
                });
            },
        );
    }
    group.finish();
}

/// Benchmark batches of increasing size (one physical write each).
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &size| {
                let engine = populated_engine(0, 0);
                let value = random_data(64);

                b.iter(|| {
                    let ops = (0..size)
                        .map(|i| BatchOp::put(bench_key(i), value.clone()))
                        .collect();
                    engine.batch(black_box(ops)).unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark range iteration.
fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for entry_count in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*entry_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entry_count),
            entry_count,
            |b, &count| {
                let engine = populated_engine(count, 64);

                b.iter(|| {
                    let seen = engine.iterator(&IteratorOptions::new()).unwrap().count();
                    black_box(seen);
                });
            },
        );
    }
    group.finish();
}

/// Benchmark puts against an encrypted file.
fn bench_file_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_put");
    group.sample_size(20);

    for entry_count in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(entry_count),
            entry_count,
            |b, &count| {
                let temp_dir = TempDir::new().unwrap();
                let engine = Engine::open_with_options(
                    temp_dir.path().join("bench.vkv"),
                    OpenOptions::new().passphrase("bench"),
                )
                .unwrap();
                let ops = (0..count)
                    .map(|i| BatchOp::put(bench_key(i), random_data(64)))
                    .collect();
                engine.batch(ops).unwrap();

                b.iter(|| {
                    engine.put(black_box(b"bench-key"), Some(b"value")).unwrap();
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_put,
    bench_get,
    bench_batch,
    bench_iterate,
    bench_file_put,
);
criterion_main!(benches);
