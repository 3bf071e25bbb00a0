#![forbid(unsafe_code)]

//! Virtualized collection widgets.
//!
//! The pieces, leaf to root:
//!
//! - [`catalog::Catalog`] - the ordered, identifier-indexed item store
//! - [`recycler::Recycler`] - identity-keyed render slots with a free pool
//! - [`selection::SelectionSet`] - session-long selected identifiers
//! - [`pagination::PaginationTrigger`] - end-of-list detection with one load in flight
//! - [`collection::CollectionView`] - runs layout, window, reconcile, and
//!   pagination in a fixed order for every host event

pub mod catalog;
pub mod collection;
pub mod config;
pub mod pagination;
pub mod recycler;
pub mod selection;

pub use catalog::{AppendReport, Catalog};
pub use collection::{CollectionView, RecomputeReport, RenderPhase};
pub use config::{CollectionConfig, ConfigError};
pub use pagination::{
    DiscardReason, EndProximity, LoadError, LoadOutcome, LoadRequest, LoadState, LoadTicket, Page,
    PaginationStats, PaginationTrigger,
};
pub use recycler::{Acquire, ReconcileReport, Recycler, RecyclerStats, Slot, SlotId};
pub use selection::SelectionSet;
pub use vista_core::Keyed;

/// Turns an item into a render node.
///
/// The recycler owns the nodes. A slot that scrolls out keeps its node, and
/// the next item bound to that slot is drawn with [`ItemRenderer::update`]
/// instead of [`ItemRenderer::create`], so allocation stays bounded by the
/// largest window seen.
pub trait ItemRenderer<T> {
    /// Whatever the host draws: a widget handle, a display list, a string.
    type Node;

    /// Build a fresh node.
    fn create(&mut self, item: &T, selected: bool) -> Self::Node;

    /// Redraw an existing node for a (possibly different) item.
    fn update(&mut self, node: &mut Self::Node, item: &T, selected: bool) {
        *node = self.create(item, selected);
    }
}

impl<T, N, F> ItemRenderer<T> for F
where
    F: FnMut(&T, bool) -> N,
{
    type Node = N;

    fn create(&mut self, item: &T, selected: bool) -> N {
        self(item, selected)
    }
}
