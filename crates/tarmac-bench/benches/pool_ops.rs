//! Criterion micro-benchmarks for resource pool acquire/release and a
//! short contended run.

use std::hint::black_box;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use tarmac_bench::contended_profile;
use tarmac_core::ResourceKind;
use tarmac_engine::{Acquire, NullReporter, ResourceCapacities, ResourcePool, Simulation};

const POLL: Duration = Duration::from_millis(5);

/// Benchmark: uncontended acquire + release of one runway unit.
fn bench_acquire_release(c: &mut Criterion) {
    let pool = ResourcePool::new(ResourceCapacities::default()).unwrap();
    c.bench_function("pool_acquire_release", |b| {
        b.iter(|| match pool.acquire(ResourceKind::Runway, POLL) {
            Acquire::Granted(permit) => black_box(pool.release(permit)),
            other => panic!("{other:?}"),
        });
    });
}

/// Benchmark: four threads cycling a single-unit tower.
fn bench_contended_tower(c: &mut Criterion) {
    let pool = Arc::new(ResourcePool::new(ResourceCapacities::uniform(1)).unwrap());
    c.bench_function("pool_contended_tower_4x100", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    thread::spawn(move || {
                        for _ in 0..100 {
                            if let Acquire::Granted(permit) =
                                pool.acquire(ResourceKind::Tower, Duration::from_secs(1))
                            {
                                pool.release(permit);
                            }
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        });
    });
}

/// Benchmark: utilization snapshot of all three resources.
fn bench_utilization(c: &mut Criterion) {
    let pool = ResourcePool::new(ResourceCapacities::default()).unwrap();
    c.bench_function("pool_utilization", |b| {
        b.iter(|| black_box(pool.utilization()));
    });
}

/// Benchmark: a whole contended run at 1 ms per unit.
fn bench_contended_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    group.sample_size(10);
    group.bench_function("contended_run_50_units", |b| {
        b.iter(|| {
            let report = Simulation::run(contended_profile(7), NullReporter).unwrap();
            black_box(report.stats.terminated());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_acquire_release,
    bench_contended_tower,
    bench_utilization,
    bench_contended_run
);
criterion_main!(benches);
