#![forbid(unsafe_code)]

//! Background page loading for collection views.
//!
//! A [`CollectionView`](vista_widgets::CollectionView) never blocks on I/O:
//! it only emits [`LoadRequest`](vista_widgets::LoadRequest)s. This crate
//! runs a [`PageLoader`] for each request on its own thread and hands the
//! result back through a channel. The event loop calls
//! [`LoadExecutor::pump`] between events, so the view is only ever touched
//! from the thread that owns it.
//!
//! ```no_run
//! use std::time::Duration;
//! use vista_core::event::CollectionEvent;
//! use vista_core::geometry::Size;
//! use vista_runtime::LoadExecutor;
//! use vista_widgets::{CollectionConfig, CollectionView, LoadRequest, Page};
//!
//! let loader = |req: &LoadRequest| -> Result<Page<u64>, std::io::Error> {
//!     let start = req.offset as u64;
//!     Ok(Page::more((start..start + 50).collect()))
//! };
//! let mut executor = LoadExecutor::new(loader);
//! let mut view = CollectionView::new(
//!     CollectionConfig::default(),
//!     Vec::<u64>::new(),
//!     true,
//!     |id: &u64, _selected: bool| *id,
//! );
//! executor.attach(&mut view);
//!
//! view.handle(CollectionEvent::Resize(Size::new(800.0, 600.0)));
//! let report = executor.wait(&mut view, Duration::from_secs(1)).unwrap();
//! assert_eq!(report.applied, 1);
//! ```

pub mod executor;

pub use executor::{LoadExecutor, LoadSpawner, PageLoader, PumpReport, RuntimeError};
