//! Registry benchmarks
//!
//! Cascade deletion scans the whole registry per directory removal; these
//! benches track how that scales with tree size.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::path::{Path, PathBuf};
use std::time::Instant;
use teawatch_core::{Entry, PathRegistry};

/// `dirs` directories with `files` files each under /bench
fn build_registry(dirs: usize, files: usize) -> PathRegistry {
    let mut entries = Vec::with_capacity(dirs * (files + 1));
    for d in 0..dirs {
        let dir = PathBuf::from(format!("/bench/dir{:04}", d));
        for f in 0..files {
            entries.push(Entry::new(dir.join(format!("file{:04}.txt", f)), false));
        }
        entries.push(Entry::new(dir, true));
    }
    PathRegistry::from_entries(entries)
}

fn bench_cascade_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade_delete");
    for size in [10usize, 100, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(size * 20), &size, |b, &size| {
            let mut registry = build_registry(size, 20);
            let target = Path::new("/bench/dir0000");
            b.iter(|| black_box(registry.cascade_delete(target, Instant::now())));
        });
    }
    group.finish();
}

fn bench_insert_resort(c: &mut Criterion) {
    c.bench_function("insert_into_10k", |b| {
        b.iter_with_setup(
            || build_registry(500, 20),
            |mut registry| black_box(registry.insert(Entry::new("/bench/dir0250/new.txt", false))),
        );
    });
}

criterion_group!(benches, bench_cascade_delete, bench_insert_resort);
criterion_main!(benches);
