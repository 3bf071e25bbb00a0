#![forbid(unsafe_code)]

//! Structured logging shims.
//!
//! Every Vista crate logs through `vista_core::debug!`, `vista_core::trace!`,
//! `vista_core::warn!`, `vista_core::error!` and `vista_core::debug_span!`.
//! With the `tracing` feature on they are the `tracing` macros. With it off
//! they expand to nothing (the span macro expands to [`NoopSpan`]), so call
//! sites never need their own `#[cfg]`.
//!
//! Arguments to a disabled macro are not evaluated, so avoid locals that
//! exist only to be logged. A helper whose only job is logging carries
//! `#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]`.
//!
//! Downstream crates forward their own `tracing` feature to
//! `vista-core/tracing`.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, error, trace, warn};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards a debug event.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards a trace event.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards a warning.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// Discards an error event.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    /// Stands in for `tracing::debug_span!`; yields a [`NoopSpan`](crate::logging::NoopSpan).
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// Span returned by `debug_span!` when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    /// Same shape as `tracing::Span::enter`.
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }

    /// Same shape as `tracing::Span::entered`.
    pub fn entered(self) -> NoopGuard {
        NoopGuard
    }
}

/// Guard returned by [`NoopSpan::entered`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;

/// Install a JSON subscriber filtered by `RUST_LOG` (default `info`).
///
/// For binaries and harness runs; the library crates never install a
/// subscriber themselves. Returns `false` when a global subscriber was
/// already set.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn macros_accept_structured_fields() {
        let items = 3usize;
        let ticket = "g0#1";
        let _span = crate::debug_span!("collection_recompute", items, first = 0usize).entered();
        crate::debug!(ticket = %ticket, items, "recomputed");
        crate::trace!(?items, "window empty");
        crate::warn!(message = "pagination_failed", ticket = %ticket);
        crate::error!("loader thread panicked: {ticket}");
        let _ = (items, ticket);
    }

    #[cfg(feature = "tracing-json")]
    #[test]
    fn json_logging_installs_once() {
        super::init_json_logging();
        assert!(!super::init_json_logging());
    }
}
