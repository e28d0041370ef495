use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fs_persister::{
    DiskRead, DiskWrite, FileSystemPersister, LocalFileSystem, SegmentPathResolver,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

fn persister(temp_dir: &TempDir, sync_writes: bool) -> FileSystemPersister<str, SegmentPathResolver> {
    let store = LocalFileSystem::new(temp_dir.path())
        .unwrap()
        .with_sync_writes(sync_writes);
    FileSystemPersister::new(Arc::new(store), SegmentPathResolver::new())
}

/// Benchmark small entry (4KB) writes, with and without fsync
fn bench_small_entry_write(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("persister_small_entry_write");

    for sync_writes in [false, true] {
        let temp_dir = TempDir::new().unwrap();
        let persister = persister(&temp_dir, sync_writes);
        let label = if sync_writes { "synced" } else { "unsynced" };

        group.bench_function(BenchmarkId::new("4kb_write", label), |b| {
            let mut counter = 0;
            b.iter(|| {
                let key = format!("bench/small-{}.bin", counter);
                counter += 1;
                let data = Bytes::from(vec![0u8; 4 * 1024]);
                rt.block_on(async {
                    persister
                        .write(black_box(key.as_str()), black_box(data))
                        .await
                        .unwrap();
                });
            });
        });
    }

    group.finish();
}

/// Benchmark large entry (10MB) writes
fn bench_large_entry_write(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let persister = persister(&temp_dir, true);

    let mut group = c.benchmark_group("persister_large_entry_write");
    group.sample_size(10); // Fewer samples for large entries

    group.bench_function("10mb_overwrite", |b| {
        let data = Bytes::from(vec![0u8; 10 * 1024 * 1024]);
        b.iter(|| {
            rt.block_on(async {
                persister
                    .write(black_box("bench/large.bin"), black_box(data.clone()))
                    .await
                    .unwrap();
            });
        });
    });

    group.finish();
}

/// Benchmark reads across entry sizes
fn bench_mixed_entry_reads(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let persister = persister(&temp_dir, false);

    let entry_sizes = vec![
        ("1kb", 1024),
        ("16kb", 16 * 1024),
        ("256kb", 256 * 1024),
        ("1mb", 1024 * 1024),
    ];

    rt.block_on(async {
        for (name, size) in &entry_sizes {
            for i in 0..10 {
                let key = format!("bench/{}/entry-{}", name, i);
                persister
                    .write(key.as_str(), Bytes::from(vec![0u8; *size]))
                    .await
                    .unwrap();
            }
        }
    });

    let mut group = c.benchmark_group("persister_mixed_reads");

    for (name, size) in entry_sizes {
        group.bench_with_input(BenchmarkId::new("read", name), &size, |b, size| {
            let mut counter = 0;
            b.iter(|| {
                let key = format!("bench/{}/entry-{}", name, counter % 10);
                counter += 1;
                rt.block_on(async {
                    let data = persister.read(black_box(key.as_str())).await.unwrap();
                    assert_eq!(data.len(), *size);
                });
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_small_entry_write,
    bench_large_entry_write,
    bench_mixed_entry_reads,
);
criterion_main!(benches);
