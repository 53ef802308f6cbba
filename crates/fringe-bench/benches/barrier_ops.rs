//! Criterion micro-benchmarks for rendezvous cycling.

use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fringe_sync::Barrier;

fn bench_barrier(c: &mut Criterion) {
    let mut group = c.benchmark_group("barrier");

    // Uncontended baseline: lock + generation bump, no blocking.
    group.bench_function("cycle_1_party", |b| {
        let barrier = Barrier::new(1);
        b.iter(|| black_box(barrier.wait().unwrap()));
    });

    // Full rendezvous: helper threads cycle as fast as the benched
    // thread completes generations.
    for parties in [2usize, 4, 8] {
        group.bench_function(format!("cycle_{parties}_parties"), |b| {
            let barrier = Arc::new(Barrier::new(parties));
            let helpers: Vec<_> = (0..parties - 1)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || while barrier.wait().is_ok() {})
                })
                .collect();

            b.iter(|| black_box(barrier.wait().unwrap()));

            // Cancellation releases the helpers' final wait.
            barrier.cancel();
            for h in helpers {
                h.join().unwrap();
            }
        });
    }

    group.finish();
}

criterion_group!(benches, bench_barrier);
criterion_main!(benches);
