#![forbid(unsafe_code)]

//! Core: geometry, host events, item identity, and logging shims.

pub mod event;
pub mod geometry;
pub mod logging;

// With tracing on, the macros live at the crate root just like the no-op ones.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, error, trace, warn};

/// A record with a stable identity.
///
/// The renderer never looks past [`Keyed::id`]: slots, selection, and
/// pagination deduplication are all keyed on it. Two records reporting the
/// same id are treated as the same item.
pub trait Keyed {
    /// Identifier type. Cheap to clone and hash.
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Debug;

    /// Return the stable identifier for this record.
    fn id(&self) -> Self::Id;
}

impl Keyed for u64 {
    type Id = u64;

    fn id(&self) -> u64 {
        *self
    }
}

impl Keyed for u32 {
    type Id = u32;

    fn id(&self) -> u32 {
        *self
    }
}

impl Keyed for String {
    type Id = String;

    fn id(&self) -> String {
        self.clone()
    }
}

impl<K, V> Keyed for (K, V)
where
    K: Clone + Eq + std::hash::Hash + std::fmt::Debug,
{
    type Id = K;

    fn id(&self) -> K {
        self.0.clone()
    }
}
