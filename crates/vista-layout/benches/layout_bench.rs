//! Benchmarks for layout and window computation.
//!
//! Run with: cargo bench -p vista-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vista_layout::window::compute_visible_range;
use vista_layout::{LayoutMode, compute_layout};

fn bench_compute_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/compute");

    for count in [100usize, 10_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::new("grid", count), &count, |b, &count| {
            b.iter(|| {
                black_box(compute_layout(
                    black_box(1440.0),
                    900.0,
                    count,
                    220.0,
                    180.0,
                    12.0,
                    LayoutMode::Grid,
                ))
            })
        });
    }

    group.finish();
}

fn bench_visible_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/window");

    for count in [1_000usize, 1_000_000] {
        let plan = compute_layout(1440.0, 900.0, count, 220.0, 180.0, 12.0, LayoutMode::Grid);
        let step = plan.max_scroll_offset() / 64.0;
        group.bench_with_input(BenchmarkId::new("sweep", count), &plan, |b, plan| {
            b.iter(|| {
                for i in 0..64 {
                    black_box(compute_visible_range(i as f32 * step, 900.0, plan, 2));
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compute_layout, bench_visible_range);
criterion_main!(benches);
