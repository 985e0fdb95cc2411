//! Criterion micro-benchmarks for statistics dispatch and liveness
//! diagnosis.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use tarmac_bench::{synthetic_events, synthetic_views};
use tarmac_core::ResourceKind;
use tarmac_engine::{diagnose, MonitorConfig, ResourceCapacities, ResourcePool, Statistics};

/// Benchmark: record the events of 100 full lifecycles.
fn bench_record_100(c: &mut Criterion) {
    let events = synthetic_events(100);
    c.bench_function("stats_record_100_lifecycles", |b| {
        b.iter(|| {
            let stats = Statistics::new();
            for e in &events {
                stats.record(e);
            }
            black_box(stats.snapshot());
        });
    });
}

/// Benchmark: snapshot with derived metrics after a populated run.
fn bench_snapshot(c: &mut Criterion) {
    let stats = Statistics::new();
    for e in &synthetic_events(100) {
        stats.record(e);
    }
    c.bench_function("stats_snapshot", |b| {
        b.iter(|| black_box(stats.snapshot()));
    });
}

/// Benchmark: diagnose a scan of 50 live aircraft.
fn bench_diagnose_50(c: &mut Criterion) {
    let unit = Duration::from_secs(1);
    let views = synthetic_views(50, unit);
    let pool = ResourcePool::new(ResourceCapacities::default()).unwrap();
    // Hold the whole tower so the scan sees a saturated resource.
    let _held: Vec<_> = (0..pool.capacity(ResourceKind::Tower))
        .map(|_| pool.acquire(ResourceKind::Tower, unit))
        .collect();
    let usage = pool.utilization();
    let config = MonitorConfig::default();
    c.bench_function("monitor_diagnose_50", |b| {
        b.iter(|| black_box(diagnose(&views, &usage, &config, unit)));
    });
}

criterion_group!(benches, bench_record_100, bench_snapshot, bench_diagnose_50);
criterion_main!(benches);
