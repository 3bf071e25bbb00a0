#![forbid(unsafe_code)]

//! Vista public facade crate.
//!
//! Re-exports the types a host needs to put a virtualized grid or list on
//! screen, plus a prelude and a single error type for the outer edges
//! (loader plumbing, environment config).

use std::fmt;
#[cfg(feature = "runtime")]
use std::time::Duration;

// --- Core re-exports -------------------------------------------------------

pub use vista_core::Keyed;
pub use vista_core::event::{CollectionEvent, RecomputeReason};
pub use vista_core::geometry::{Size, SlotRect, Viewport};

// --- Layout re-exports -----------------------------------------------------

pub use vista_layout::window::{VisibleRange, compute_visible_range};
pub use vista_layout::{LayoutMode, LayoutPlan, LayoutSpec, compute_layout};

// --- Widget re-exports -----------------------------------------------------

pub use vista_widgets::{
    Catalog, CollectionConfig, CollectionView, ConfigError, ItemRenderer, LoadError, LoadOutcome,
    LoadRequest, LoadState, LoadTicket, Page, RecomputeReport, RenderPhase, SelectionSet, Slot,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use vista_runtime::{LoadExecutor, PageLoader, PumpReport, RuntimeError};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Vista hosts.
#[derive(Debug)]
pub enum Error {
    /// Nothing can deliver load results any more.
    LoaderDisconnected,
    /// Waited for a load result and none arrived.
    #[cfg(feature = "runtime")]
    Timeout(Duration),
    /// A page load failed; the loader's error, rendered.
    Load(String),
    /// An environment override could not be parsed.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoaderDisconnected => write!(f, "page loader disconnected"),
            #[cfg(feature = "runtime")]
            Self::Timeout(after) => write!(f, "no page load completed within {after:?}"),
            Self::Load(msg) => write!(f, "{msg}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl<E: fmt::Display> From<LoadError<E>> for Error {
    fn from(err: LoadError<E>) -> Self {
        Self::Load(err.to_string())
    }
}

#[cfg(feature = "runtime")]
impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Timeout(after) => Self::Timeout(after),
            RuntimeError::Disconnected => Self::LoaderDisconnected,
        }
    }
}

/// Standard result type for Vista APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Catalog, CollectionConfig, CollectionEvent, CollectionView, Error, ItemRenderer, Keyed,
        LayoutMode, LoadRequest, Page, RenderPhase, Result, Size,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{LoadExecutor, PageLoader};

    pub use crate::{core, layout, widgets};
}

pub use vista_core as core;
pub use vista_layout as layout;
#[cfg(feature = "runtime")]
pub use vista_runtime as runtime;
pub use vista_widgets as widgets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_keeps_source() {
        let err: Error = CollectionConfig::try_from_env_with(|key| {
            (key == "VISTA_LAYOUT_MODE").then(|| "mosaic".to_string())
        })
        .unwrap_err()
        .into();
        assert!(matches!(err, Error::Config(_)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("VISTA_LAYOUT_MODE"));
    }

    #[test]
    fn load_error_is_rendered() {
        let mut view = CollectionView::new(
            CollectionConfig::default(),
            Vec::<u64>::new(),
            true,
            |id: &u64, _selected: bool| *id,
        );
        let report = view.handle(CollectionEvent::Resize(Size::new(400.0, 400.0)));
        let ticket = report.load_request.unwrap().ticket;
        let err: Error = view
            .complete_load(ticket, Err::<Page<u64>, _>("offline"))
            .unwrap_err()
            .into();
        assert_eq!(err.to_string(), format!("page load {ticket} failed: offline"));
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn runtime_errors_map() {
        assert!(matches!(
            Error::from(RuntimeError::Disconnected),
            Error::LoaderDisconnected
        ));
        assert!(matches!(
            Error::from(RuntimeError::Timeout(Duration::from_millis(3))),
            Error::Timeout(_)
        ));
    }

    #[test]
    fn prelude_is_enough_for_a_view() {
        use crate::prelude::*;

        let mut view = CollectionView::new(
            CollectionConfig::default().with_mode(LayoutMode::List),
            (0..50u64).collect(),
            false,
            |id: &u64, _selected: bool| *id,
        );
        view.handle(CollectionEvent::Resize(Size::new(300.0, 250.0)));
        assert_eq!(view.phase(), RenderPhase::Items);
        assert_eq!(view.layout().columns, 1);
    }
}
