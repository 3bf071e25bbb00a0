#![forbid(unsafe_code)]

//! Test harness for Vista collection views.
//!
//! - **Scroll storms**: seeded scroll/resize sequences with JSONL logs that
//!   replay byte-for-byte ([`scroll_storm`]).
//! - **Fixtures**: a `Project` record, a renderer that logs every draw, and a
//!   scripted page loader ([`fixtures`]).
//!
//! # Quick Start
//!
//! ```
//! use vista_core::event::CollectionEvent;
//! use vista_core::geometry::Size;
//! use vista_harness::fixtures::{Project, RecordingRenderer};
//! use vista_widgets::{CollectionConfig, CollectionView};
//!
//! let mut view = CollectionView::new(
//!     CollectionConfig::default(),
//!     Project::batch(0..1_000),
//!     false,
//!     RecordingRenderer::new(),
//! );
//! view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));
//! assert_eq!(view.renderer().created(), 40);
//! ```

pub mod fixtures;
pub mod scroll_storm;

pub use fixtures::{Project, ProjectCard, RecordingRenderer, RequestQueue, ScriptedLoader};
pub use scroll_storm::{ScrollStorm, StormConfig, StormLog, StormPattern, StormStep, StormSummary};
