//! Container benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use vaultkv_bench::random_data;
use vaultkv_storage::{seal, unseal, ContainerBackend, ContainerHeader, EncryptedFile};

/// Benchmark sealing payloads (key derivation + AES-256-GCM).
fn bench_seal(c: &mut Criterion) {
    let mut group = c.benchmark_group("seal");
    let header = ContainerHeader::new("bench", "1");

    for size in [1024, 16 * 1024, 256 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let payload = random_data(size);
            b.iter(|| {
                let sealed = seal(b"passphrase", &header, black_box(&payload)).unwrap();
                black_box(sealed);
            });
        });
    }
    group.finish();
}

/// Benchmark unsealing payloads.
fn bench_unseal(c: &mut Criterion) {
    let mut group = c.benchmark_group("unseal");
    let header = ContainerHeader::new("bench", "1");

    for size in [1024, 16 * 1024, 256 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let sealed = seal(b"passphrase", &header, &random_data(size)).unwrap();
            b.iter(|| {
                let opened = unseal(b"passphrase", black_box(&sealed)).unwrap();
                black_box(opened);
            });
        });
    }
    group.finish();
}

/// Benchmark full container rewrites on disk.
fn bench_file_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_write");
    group.sample_size(20);

    for size in [1024, 64 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let mut file = EncryptedFile::new(
                &temp_dir.path().join("bench.vkv"),
                b"passphrase",
                ContainerHeader::default(),
            );
            let payload = random_data(size);

            b.iter(|| {
                file.write(black_box(&payload)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_seal, bench_unseal, bench_file_write);
criterion_main!(benches);
