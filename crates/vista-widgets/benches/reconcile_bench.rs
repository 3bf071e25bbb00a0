//! Benchmarks for recycler reconciliation and full recompute passes.
//!
//! Run with: cargo bench -p vista-widgets

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vista_core::event::CollectionEvent;
use vista_core::geometry::Size;
use vista_layout::window::compute_visible_range;
use vista_layout::{LayoutMode, compute_layout};
use vista_widgets::{Catalog, CollectionConfig, CollectionView, Recycler, SelectionSet};

fn render(item: &u64, selected: bool) -> (u64, bool) {
    (*item, selected)
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("recycler/reconcile");

    for overscan in [0usize, 2, 8] {
        let layout = compute_layout(1440.0, 900.0, 100_000, 220.0, 180.0, 12.0, LayoutMode::Grid);
        let catalog: Catalog<u64> = (0..100_000u64).collect();
        let selection = SelectionSet::new();
        let step = layout.row_extent / 3.0;

        group.bench_with_input(
            BenchmarkId::new("scroll_step", overscan),
            &overscan,
            |b, &overscan| {
                let mut recycler = Recycler::new();
                let mut renderer = render;
                let mut offset = 0.0f32;
                b.iter(|| {
                    offset = (offset + step) % layout.max_scroll_offset();
                    let range = compute_visible_range(offset, 900.0, &layout, overscan);
                    black_box(recycler.reconcile(
                        range.as_ref(),
                        &catalog,
                        &layout,
                        &selection,
                        &mut renderer,
                    ))
                })
            },
        );
    }

    group.finish();
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection/recompute");

    for count in [10_000u64, 1_000_000] {
        group.bench_with_input(BenchmarkId::new("scroll", count), &count, |b, &count| {
            let mut view = CollectionView::new(
                CollectionConfig::default(),
                (0..count).collect(),
                false,
                render,
            );
            view.handle(CollectionEvent::Resize(Size::new(1440.0, 900.0)));
            let max = view.layout().max_scroll_offset();
            let mut offset = 0.0f32;
            b.iter(|| {
                offset = (offset + 37.0) % max;
                black_box(view.handle(CollectionEvent::Scroll(offset)))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile, bench_recompute);
criterion_main!(benches);
