#![forbid(unsafe_code)]

//! Layout primitives for virtualized collections.
//!
//! This crate turns a container size, an item count, and a handful of size
//! hints into geometry:
//!
//! - [`LayoutPlan`] - columns, rows, and extents for a grid or list
//! - [`window`] - which rows/items must be materialized for a scroll offset
//!
//! Everything here is pure. The same inputs always produce a bit-identical
//! [`LayoutPlan`], so it is safe to recompute on every resize event.
//!
//! # Example
//!
//! ```
//! use vista_core::geometry::Size;
//! use vista_layout::{LayoutMode, LayoutPlan, LayoutSpec};
//! use vista_layout::window::compute_visible_range;
//!
//! let spec = LayoutSpec::grid(200.0, 100.0);
//! let plan = LayoutPlan::compute(&spec, Size::new(800.0, 800.0), 10_000);
//! assert_eq!(plan.columns, 4);
//!
//! let range = compute_visible_range(0.0, 800.0, &plan, 2).unwrap();
//! assert_eq!((range.first_index, range.last_index), (0, 39));
//! # let _ = LayoutMode::Grid;
//! ```

pub mod window;

pub use vista_core::geometry::{Size, SlotRect, Viewport};
pub use window::{VisibleRange, compute_visible_range, index_at, offset_for_index, slot_rect};

use vista_core::geometry::sanitize;

/// Upper bound on grid columns; keeps degenerate `min_item_width` values
/// from producing absurd column counts.
pub const MAX_COLUMNS: usize = 1 << 16;

/// Arrangement of items inside the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LayoutMode {
    /// As many columns as fit `min_item_width`.
    #[default]
    Grid,
    /// A single full-width column.
    List,
}

impl LayoutMode {
    /// Parse a mode name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grid" | "g" => Some(Self::Grid),
            "list" | "l" | "rows" => Some(Self::List),
            _ => None,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::List => "list",
        }
    }
}

/// Size hints that, together with a container size and item count, fully
/// determine a [`LayoutPlan`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutSpec {
    /// Grid or list.
    pub mode: LayoutMode,
    /// Minimum cell width in grid mode. Ignored for lists.
    pub min_item_width: f32,
    /// Fixed height of every item.
    pub item_height: f32,
    /// Spacing between rows, and between columns in grid mode.
    pub gap: f32,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self::grid(200.0, 100.0)
    }
}

impl LayoutSpec {
    /// Grid layout with no gap.
    #[must_use]
    pub const fn grid(min_item_width: f32, item_height: f32) -> Self {
        Self {
            mode: LayoutMode::Grid,
            min_item_width,
            item_height,
            gap: 0.0,
        }
    }

    /// List layout with no gap.
    #[must_use]
    pub const fn list(item_height: f32) -> Self {
        Self {
            mode: LayoutMode::List,
            min_item_width: 0.0,
            item_height,
            gap: 0.0,
        }
    }

    /// Set the gap.
    #[must_use]
    pub const fn gap(mut self, gap: f32) -> Self {
        self.gap = gap;
        self
    }

    /// Set the mode.
    #[must_use]
    pub const fn mode(mut self, mode: LayoutMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Derived geometry for one (container, item count) pair.
///
/// Never mutated in place; a new plan replaces the old one whenever the
/// container width or the catalog length changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutPlan {
    /// Mode the plan was computed for.
    pub mode: LayoutMode,
    /// Number of items laid out.
    pub item_count: usize,
    /// Width of one item.
    pub item_width: f32,
    /// Height of one item.
    pub item_height: f32,
    /// Columns per row (always at least 1).
    pub columns: usize,
    /// `ceil(item_count / columns)`.
    pub total_rows: usize,
    /// Vertical distance between consecutive row origins (`item_height + gap`).
    pub row_extent: f32,
    /// Horizontal distance between consecutive column origins.
    pub column_extent: f32,
    /// `total_rows * row_extent`.
    pub total_extent: f32,
    /// Container height the plan was computed against.
    pub viewport_height: f32,
}

impl LayoutPlan {
    /// Compute the plan for `item_count` items in a container of `container` size.
    ///
    /// Degenerate inputs (zero, negative, NaN) are treated as `0.0`; the
    /// result still has `columns >= 1`.
    #[must_use]
    pub fn compute(spec: &LayoutSpec, container: Size, item_count: usize) -> Self {
        let width = sanitize(container.width);
        let viewport_height = sanitize(container.height);
        let gap = sanitize(spec.gap);
        let item_height = sanitize(spec.item_height);

        let columns = match spec.mode {
            LayoutMode::List => 1,
            LayoutMode::Grid => grid_columns(width, sanitize(spec.min_item_width), gap),
        };

        let total_rows = item_count.div_ceil(columns);
        let row_extent = item_height + gap;
        let total_extent = total_rows as f32 * row_extent;

        let (item_width, column_extent) = match spec.mode {
            LayoutMode::List => (width, width),
            LayoutMode::Grid => {
                let column_extent = (width - gap).max(0.0) / columns as f32;
                ((column_extent - gap).max(0.0), column_extent)
            }
        };

        Self {
            mode: spec.mode,
            item_count,
            item_width,
            item_height,
            columns,
            total_rows,
            row_extent,
            column_extent,
            total_extent,
            viewport_height,
        }
    }

    /// Whether there is nothing to lay out.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Largest meaningful scroll offset for the recorded viewport height.
    #[must_use]
    pub fn max_scroll_offset(&self) -> f32 {
        (self.total_extent - self.viewport_height).max(0.0)
    }

    /// Row that holds `index`.
    #[inline]
    #[must_use]
    pub fn row_of(&self, index: usize) -> usize {
        index / self.columns.max(1)
    }

    /// Column that holds `index`.
    #[inline]
    #[must_use]
    pub fn column_of(&self, index: usize) -> usize {
        index % self.columns.max(1)
    }
}

/// `max(1, floor((width - gap) / (min_item_width + gap)))`, capped at [`MAX_COLUMNS`].
fn grid_columns(width: f32, min_item_width: f32, gap: f32) -> usize {
    let denom = min_item_width + gap;
    if denom <= 0.0 {
        return 1;
    }
    let raw = ((width - gap) / denom).floor();
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    (raw as usize).min(MAX_COLUMNS)
}

/// Flat-argument form of [`LayoutPlan::compute`].
///
/// `container_height` only feeds [`LayoutPlan::max_scroll_offset`]; it has no
/// effect on columns or rows.
#[must_use]
pub fn compute_layout(
    container_width: f32,
    container_height: f32,
    item_count: usize,
    min_item_width: f32,
    item_height: f32,
    gap: f32,
    mode: LayoutMode,
) -> LayoutPlan {
    let spec = LayoutSpec {
        mode,
        min_item_width,
        item_height,
        gap,
    };
    LayoutPlan::compute(&spec, Size::new(container_width, container_height), item_count)
}
