//! Benchmarks for category collection and archiving.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use diag_collector::collectors::collector::collect_category;
use diag_collector::collectors::orchestrator::{NoProgress, Orchestrator, ScheduleMode};
use diag_collector::config::{Category, ExclusionPolicy, SourceEntry};
use diag_collector::lifecycle::CancelToken;
use diag_collector::utils::compress::create_archive;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Directory with `count` log files of `size` bytes plus some excluded binaries
fn source_tree(count: usize, size: usize) -> (TempDir, u64) {
    let temp_dir = TempDir::new().unwrap();
    let mut total = 0u64;
    for i in 0..count {
        let dir = temp_dir.path().join(format!("sub_{}", i % 8));
        fs::create_dir_all(&dir).unwrap();
        let data = format!("log line {}\n", i).repeat(size / 12 + 1);
        fs::write(dir.join(format!("file_{}.log", i)), &data).unwrap();
        fs::write(dir.join(format!("file_{}.dll", i)), b"MZ").unwrap();
        total += data.len() as u64;
    }
    (temp_dir, total)
}

fn category(name: &str, root: &Path) -> Category {
    Category::new(name, vec![SourceEntry::path(root.to_string_lossy().to_string())])
}

/// Benchmark one category with different numbers of files
fn bench_category_file_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("category_file_count");
    let policy = ExclusionPolicy::default();

    for count in [1, 10, 100, 500] {
        let (src, total) = source_tree(count, 4 * 1024);
        let cat = category("Bench", src.path());

        group.throughput(Throughput::Bytes(total));
        group.bench_with_input(BenchmarkId::new("collect", count), &cat, |b, cat| {
            b.iter_batched(
                || TempDir::new().unwrap(),
                |staging| collect_category(black_box(cat), staging.path(), &policy),
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

/// Benchmark parallel against sequential scheduling over several categories
fn bench_schedule_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule_modes");
    let trees: Vec<(TempDir, u64)> = (0..8).map(|_| source_tree(50, 16 * 1024)).collect();
    let total: u64 = trees.iter().map(|(_, t)| t).sum();
    let categories: Vec<Category> = trees
        .iter()
        .enumerate()
        .map(|(i, (dir, _))| category(&format!("Category {}", i), dir.path()))
        .collect();

    group.throughput(Throughput::Bytes(total));
    for (label, mode) in [("parallel", ScheduleMode::Parallel), ("sequential", ScheduleMode::Sequential)] {
        let orch = Orchestrator::new(categories.clone(), ExclusionPolicy::default()).with_mode(mode);
        group.bench_function(label, |b| {
            b.iter_batched(
                || TempDir::new().unwrap(),
                |staging| orch.run(staging.path(), &CancelToken::manual(), &NoProgress),
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

/// Benchmark archiving a populated staging tree
fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("archive");
    let (staging, total) = source_tree(200, 32 * 1024);
    let out = TempDir::new().unwrap();
    let dest = out.path().join("bench.zip");
    let policy = ExclusionPolicy::default();

    group.throughput(Throughput::Bytes(total));
    group.bench_function("deflate_level_6", |b| {
        b.iter(|| {
            let _ = create_archive(black_box(staging.path()), &dest, &policy, "BENCH");
            fs::remove_file(&dest).ok();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_category_file_count, bench_schedule_modes, bench_archive);
criterion_main!(benches);
