//! Criterion benchmarks for the per-event hot path.
//!
//! Every captured keystroke and mouse movement goes through `classify` and
//! one `dispatch_to` call on the engine's hook thread, so both must stay in
//! the sub-microsecond range for small subscriber counts.
//!
//! Run with:
//! ```bash
//! cargo bench --package iohook-core --bench dispatch_bench
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use iohook_core::{classify, CallbackRegistry, EventCallback, EventCategory, RawEventRecord};

/// Raw codes as they arrive in a typical burst, including unmapped lifecycle codes.
const BENCH_TYPE_CODES: &[u16] = &[1, 4, 3, 5, 9, 9, 9, 7, 10, 10, 8, 6, 11, 2, 0xFF];

fn counting_callback(counter: &Arc<AtomicU64>) -> EventCallback {
    let counter = Arc::clone(counter);
    Arc::new(move |_record: &RawEventRecord| {
        counter.fetch_add(1, Ordering::Relaxed);
    })
}

// ── Benchmarks: classification ───────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    group.bench_function("classify_single", |b| b.iter(|| classify(black_box(9))));

    group.bench_function("classify_batch_15", |b| {
        b.iter(|| {
            BENCH_TYPE_CODES
                .iter()
                .map(|&code| classify(black_box(code)))
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

// ── Benchmarks: registry dispatch ────────────────────────────────────────────

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let record = RawEventRecord::mouse(EventCategory::MouseMove, 0, 0, 640, 480);

    for subscribers in [1usize, 4, 16] {
        let counter = Arc::new(AtomicU64::new(0));
        let mut registry = CallbackRegistry::new();
        for _ in 0..subscribers {
            registry.subscribe(EventCategory::MouseMove, counting_callback(&counter));
        }

        group.bench_with_input(
            BenchmarkId::new("dispatch_to", subscribers),
            &registry,
            |b, registry| b.iter(|| registry.dispatch_to(EventCategory::MouseMove, black_box(&record))),
        );
    }

    // Category with no subscribers: the common case for mouse motion when
    // only keyboard events are of interest.
    let registry = CallbackRegistry::new();
    group.bench_function("dispatch_to_empty", |b| {
        b.iter(|| registry.dispatch_to(EventCategory::MouseMove, black_box(&record)))
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_dispatch);
criterion_main!(benches);
