//! End-to-end tests: a view, a background loader, and the pump loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vista_core::event::CollectionEvent;
use vista_core::geometry::Size;
use vista_runtime::{LoadExecutor, RuntimeError};
use vista_widgets::{CollectionConfig, CollectionView, LoadRequest, Page};

const WAIT: Duration = Duration::from_secs(5);

fn render(item: &u64, selected: bool) -> (u64, bool) {
    (*item, selected)
}

type View = CollectionView<u64, fn(&u64, bool) -> (u64, bool)>;

fn empty_view(has_more: bool) -> View {
    CollectionView::new(
        CollectionConfig::default(),
        Vec::new(),
        has_more,
        render as fn(&u64, bool) -> (u64, bool),
    )
}

fn paged(total: u64, page: u64) -> impl Fn(&LoadRequest) -> Result<Page<u64>, String> + Send + Sync {
    move |req: &LoadRequest| {
        let start = req.offset as u64;
        let end = (start + page).min(total);
        let items = (start..end).collect();
        Ok(Page {
            items,
            has_more: end < total,
        })
    }
}

#[test]
fn first_page_loads_on_measure() {
    let mut executor = LoadExecutor::new(paged(1_000, 100));
    let mut view = empty_view(true);
    executor.attach(&mut view);

    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));
    assert!(view.load_state().is_loading);

    let report = executor.wait(&mut view, WAIT).unwrap();
    assert_eq!(report.applied, 1);
    assert!(report.failures.is_empty());
    assert_eq!(view.catalog().len(), 100);
    // 25 rows, window ends at row 9: not near the end, so nothing else in flight
    assert!(!view.load_state().is_loading);
    assert_eq!(view.slots().count(), 40);
}

#[test]
fn scrolling_to_the_end_pages_through_everything() {
    let mut executor = LoadExecutor::new(paged(500, 100));
    let mut view = empty_view(true);
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));

    for _ in 0..20 {
        if !view.load_state().is_loading {
            break;
        }
        executor.wait(&mut view, WAIT).unwrap();
        view.handle(CollectionEvent::ScrollBy(1.0e6));
    }
    executor.join_all();
    executor.pump(&mut view);

    assert_eq!(view.catalog().len(), 500);
    assert!(!view.load_state().has_more);
    assert!(!view.load_state().is_loading);
    assert_eq!(executor.outstanding(), 0);
}

#[test]
fn burst_of_scrolls_spawns_one_loader() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut executor = LoadExecutor::new(move |req: &LoadRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(Page::more(vec![req.offset as u64 + 1_000]))
    });
    let mut view = CollectionView::new(
        CollectionConfig::default(),
        (0..100u64).collect(),
        true,
        render as fn(&u64, bool) -> (u64, bool),
    );
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));

    for i in 0..50 {
        view.handle(CollectionEvent::Scroll(1_700.0 + i as f32));
    }
    executor.join_all();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn loader_error_is_reported_and_not_retried() {
    let mut executor =
        LoadExecutor::new(|_: &LoadRequest| Err::<Page<u64>, _>("backend down".to_string()));
    let mut view = empty_view(true);
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));

    let report = executor.wait(&mut view, WAIT).unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].to_string().contains("backend down"));
    assert!(view.catalog().is_empty());
    assert!(!view.load_state().is_loading);
    assert!(view.load_state().has_more);

    // scrolling does not silently retry
    view.handle(CollectionEvent::Scroll(0.0));
    assert!(matches!(
        executor.wait(&mut view, Duration::from_millis(50)),
        Err(RuntimeError::Timeout(_))
    ));

    // an explicit retry does
    view.retry_load();
    let report = executor.wait(&mut view, WAIT).unwrap();
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn empty_pages_do_not_loop_without_input() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut executor = LoadExecutor::new(move |_: &LoadRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(Page::<u64>::more(Vec::new()))
    });
    let mut view = empty_view(true);
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));

    let report = executor.wait(&mut view, WAIT).unwrap();
    assert_eq!(report.applied, 1);
    assert!(!view.load_state().is_loading);
    assert!(view.pagination().is_stalled());

    for _ in 0..4 {
        assert!(matches!(
            executor.wait(&mut view, Duration::from_millis(25)),
            Err(RuntimeError::Timeout(_))
        ));
    }
    executor.join_all();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // user input asks again, once
    view.handle(CollectionEvent::Scroll(0.0));
    executor.wait(&mut view, WAIT).unwrap();
    executor.join_all();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn panicking_loader_releases_the_trigger() {
    let mut executor = LoadExecutor::new(|_: &LoadRequest| -> Result<Page<u64>, String> {
        panic!("loader exploded")
    });
    let mut view = empty_view(true);
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));

    let report = executor.wait(&mut view, WAIT).unwrap();
    assert_eq!(report.panics, vec!["loader exploded".to_string()]);
    assert!(!view.load_state().is_loading);
    assert!(view.pagination().has_failed());
}

#[test]
fn replaced_catalog_discards_inflight_result() {
    let mut executor = LoadExecutor::new(paged(1_000, 10));
    let mut view = empty_view(true);
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));
    let stale = view.last_report().unwrap().load_request.unwrap().ticket;

    view.replace_catalog((5_000..5_004u64).collect(), false);
    executor.join_all();
    let report = executor.pump(&mut view);

    assert_eq!(report.discarded, 1);
    assert_eq!(report.applied, 0);
    assert_eq!(view.catalog().len(), 4);
    assert!(view.pagination().generation() > stale.generation());
}

#[test]
fn pump_without_work_is_empty() {
    let mut executor = LoadExecutor::new(paged(10, 10));
    let mut view = empty_view(false);
    executor.attach(&mut view);
    view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));
    assert!(executor.pump(&mut view).is_empty());
}
