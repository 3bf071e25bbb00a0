#![forbid(unsafe_code)]

//! Host events consumed by the collection view.
//!
//! Every event funnels into the same recompute pass; the variant only
//! decides which parts of the cached state are marked stale first.

use bitflags::bitflags;

use crate::geometry::Size;

/// A discrete event delivered by the host environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectionEvent {
    /// The container was measured or resized.
    Resize(Size),
    /// Absolute scroll position changed.
    Scroll(f32),
    /// Relative scroll (wheel / keyboard). Positive scrolls toward the end.
    ScrollBy(f32),
    /// Force a layout pass with unchanged inputs.
    ///
    /// Catalog edits made through the view already recompute; this is for
    /// hosts whose own cached geometry went stale (a theme or font change).
    /// Slots that stay in the window are not redrawn.
    CatalogChanged,
}

impl CollectionEvent {
    /// Which cached stages this event invalidates.
    #[must_use]
    pub fn reasons(&self) -> RecomputeReason {
        match self {
            Self::Resize(_) => RecomputeReason::RESIZE,
            Self::Scroll(_) | Self::ScrollBy(_) => RecomputeReason::SCROLL,
            Self::CatalogChanged => RecomputeReason::CATALOG,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Resize(_) => "resize",
            Self::Scroll(_) => "scroll",
            Self::ScrollBy(_) => "scroll_by",
            Self::CatalogChanged => "catalog_changed",
        }
    }
}

bitflags! {
    /// Why a recompute pass ran.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RecomputeReason: u8 {
        /// Container size changed.
        const RESIZE = 0b0000_0001;
        /// Scroll offset changed.
        const SCROLL = 0b0000_0010;
        /// Catalog length or contents changed.
        const CATALOG = 0b0000_0100;
        /// Selection changed; only slot contents need refreshing.
        const SELECTION = 0b0000_1000;
        /// A page load finished.
        const LOAD = 0b0001_0000;
    }
}

impl RecomputeReason {
    /// Whether the layout plan must be rebuilt (width or length changed).
    #[must_use]
    pub fn needs_layout(self) -> bool {
        self.intersects(Self::RESIZE | Self::CATALOG | Self::LOAD)
    }
}
