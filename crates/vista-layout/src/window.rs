#![forbid(unsafe_code)]

//! Visible window calculation.
//!
//! Given a scroll offset and a [`LayoutPlan`], decide which contiguous run of
//! items must be materialized. The window is computed in rows, padded by an
//! overscan margin, clamped, and then mapped back to item indices.
//!
//! # Invariants
//!
//! - A returned range always satisfies `first_index <= last_index < item_count`.
//! - Offsets past the end of the content (for example right after the catalog
//!   shrank) clamp to the last row instead of producing an inverted range.
//! - An empty plan, a zero row extent, or an unmeasured viewport yields `None`.

use std::ops::RangeInclusive;

use vista_core::geometry::{SlotRect, sanitize};

use crate::LayoutPlan;

/// Inclusive run of item indices to materialize, plus the rows it spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibleRange {
    /// First item index (inclusive).
    pub first_index: usize,
    /// Last item index (inclusive).
    pub last_index: usize,
    /// First row including overscan.
    pub first_row: usize,
    /// Last row including overscan.
    pub last_row: usize,
    /// First row that actually intersects the viewport.
    pub first_visible_row: usize,
    /// Last row that actually intersects the viewport.
    pub last_visible_row: usize,
}

impl VisibleRange {
    /// Number of items in the range.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_index - self.first_index + 1
    }

    /// Never true; a range holds at least one item. Present for clippy.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `index` is inside the range.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.first_index && index <= self.last_index
    }

    /// Item indices as a std range.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> RangeInclusive<usize> {
        self.first_index..=self.last_index
    }

    /// Whether two windows share at least one index.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.first_index <= other.last_index && other.first_index <= self.last_index
    }
}

/// Compute the item range for a scroll position.
///
/// The first visible row is `floor(offset / row_extent)`. The last visible
/// row is the one holding the last visible pixel, i.e.
/// `ceil((offset + viewport_height) / row_extent) - 1`; a row whose top
/// edge sits exactly on the viewport's bottom edge is not visible. Both are
/// widened by `overscan_rows` and clamped to `[0, total_rows - 1]`.
#[must_use]
pub fn compute_visible_range(
    scroll_offset: f32,
    viewport_height: f32,
    layout: &LayoutPlan,
    overscan_rows: usize,
) -> Option<VisibleRange> {
    let row_extent = layout.row_extent;
    let viewport_height = sanitize(viewport_height);
    if layout.item_count == 0
        || layout.total_rows == 0
        || !(row_extent > 0.0)
        || viewport_height <= 0.0
    {
        return None;
    }

    let offset = sanitize(scroll_offset);
    let last_row_index = layout.total_rows - 1;

    // float -> usize casts saturate, so huge offsets land on the clamp below.
    let first_visible_row = ((offset / row_extent).floor() as usize).min(last_row_index);
    let end = offset + viewport_height;
    let last_visible_row = ((end / row_extent).ceil() as usize)
        .saturating_sub(1)
        .max(first_visible_row)
        .min(last_row_index);

    let first_row = first_visible_row.saturating_sub(overscan_rows);
    let last_row = last_visible_row
        .saturating_add(overscan_rows)
        .min(last_row_index);

    let columns = layout.columns.max(1);
    let first_index = first_row * columns;
    let last_index = last_row
        .saturating_add(1)
        .saturating_mul(columns)
        .min(layout.item_count)
        - 1;

    Some(VisibleRange {
        first_index,
        last_index,
        first_row,
        last_row,
        first_visible_row,
        last_visible_row,
    })
}

/// Absolute position of the slot for `index`.
///
/// Depends only on the index and the plan, never on the item's content:
/// `y = row * row_extent`, `x = column * column_extent`.
#[must_use]
pub fn slot_rect(index: usize, layout: &LayoutPlan) -> SlotRect {
    let row = layout.row_of(index);
    let column = layout.column_of(index);
    SlotRect::new(
        column as f32 * layout.column_extent,
        row as f32 * layout.row_extent,
        layout.item_width,
        layout.item_height,
    )
}

/// Scroll offset that puts the row of `index` at the top of the viewport,
/// clamped to the scrollable extent.
#[must_use]
pub fn offset_for_index(index: usize, layout: &LayoutPlan) -> f32 {
    if layout.is_empty() {
        return 0.0;
    }
    let index = index.min(layout.item_count - 1);
    let top = layout.row_of(index) as f32 * layout.row_extent;
    top.min(layout.max_scroll_offset()).max(0.0)
}

/// Hit test: the item under a point in content coordinates.
///
/// Points in the gap between items still resolve to the item whose column
/// and row origin precede them.
#[must_use]
pub fn index_at(x: f32, y: f32, layout: &LayoutPlan) -> Option<usize> {
    if layout.is_empty() || !(layout.row_extent > 0.0) || !(layout.column_extent > 0.0) {
        return None;
    }
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return None;
    }
    let row = (y / layout.row_extent).floor() as usize;
    let column = (x / layout.column_extent).floor() as usize;
    if column >= layout.columns {
        return None;
    }
    let index = row.checked_mul(layout.columns)?.checked_add(column)?;
    (index < layout.item_count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutMode, compute_layout};

    fn grid(count: usize) -> LayoutPlan {
        compute_layout(800.0, 800.0, count, 200.0, 100.0, 0.0, LayoutMode::Grid)
    }

    #[test]
    fn ten_thousand_items_at_top() {
        let plan = grid(10_000);
        let range = compute_visible_range(0.0, 800.0, &plan, 2).unwrap();
        assert_eq!(range.first_index, 0);
        assert_eq!(range.last_index, 39);
        assert_eq!(range.first_visible_row, 0);
        assert_eq!(range.last_visible_row, 7);
        assert_eq!(range.last_row, 9);
        assert_eq!(range.len(), 40);
    }

    #[test]
    fn overscan_applies_both_sides_mid_scroll() {
        let plan = grid(10_000);
        // rows 10..=17 visible, 8..=19 with overscan
        let range = compute_visible_range(1000.0, 800.0, &plan, 2).unwrap();
        assert_eq!(range.first_row, 8);
        assert_eq!(range.last_row, 19);
        assert_eq!(range.first_index, 32);
        assert_eq!(range.last_index, 79);
    }

    #[test]
    fn partial_row_offset_includes_both_rows() {
        let plan = grid(10_000);
        let range = compute_visible_range(150.0, 800.0, &plan, 0).unwrap();
        assert_eq!(range.first_visible_row, 1);
        // 950 / 100 -> 9.5 -> row 9 holds the last pixel
        assert_eq!(range.last_visible_row, 9);
    }

    #[test]
    fn clamps_at_bottom() {
        let plan = grid(10_000);
        let range = compute_visible_range(plan.max_scroll_offset(), 800.0, &plan, 2).unwrap();
        assert_eq!(range.last_index, 9_999);
        assert_eq!(range.last_row, plan.total_rows - 1);
    }

    #[test]
    fn partial_last_row_clamps_to_item_count() {
        let plan = grid(10);
        let range = compute_visible_range(0.0, 800.0, &plan, 2).unwrap();
        assert_eq!(range.first_index, 0);
        assert_eq!(range.last_index, 9);
    }

    #[test]
    fn offset_past_end_after_shrink_stays_ordered() {
        let plan = grid(12);
        let range = compute_visible_range(50_000.0, 800.0, &plan, 1).unwrap();
        assert!(range.first_index <= range.last_index);
        assert_eq!(range.last_index, 11);
        assert_eq!(range.first_visible_row, 2);
    }

    #[test]
    fn empty_and_degenerate_return_none() {
        assert!(compute_visible_range(0.0, 800.0, &grid(0), 2).is_none());
        assert!(compute_visible_range(0.0, 0.0, &grid(10), 2).is_none());
        let flat = compute_layout(800.0, 800.0, 10, 200.0, 0.0, 0.0, LayoutMode::Grid);
        assert!(compute_visible_range(0.0, 800.0, &flat, 2).is_none());
    }

    #[test]
    fn negative_and_nan_offsets_are_top() {
        let plan = grid(100);
        let a = compute_visible_range(-500.0, 800.0, &plan, 0).unwrap();
        let b = compute_visible_range(f32::NAN, 800.0, &plan, 0).unwrap();
        assert_eq!(a.first_index, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn list_mode_maps_rows_to_indices() {
        let plan = compute_layout(400.0, 300.0, 50, 0.0, 30.0, 0.0, LayoutMode::List);
        let range = compute_visible_range(90.0, 300.0, &plan, 1).unwrap();
        // visible rows 3..=12, overscan -> 2..=13
        assert_eq!(range.first_index, 2);
        assert_eq!(range.last_index, 13);
    }

    #[test]
    fn slot_rect_from_index() {
        let plan = grid(100);
        assert_eq!(slot_rect(0, &plan), SlotRect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(slot_rect(6, &plan), SlotRect::new(400.0, 100.0, 200.0, 100.0));
    }

    #[test]
    fn offset_for_index_clamps() {
        let plan = grid(100);
        assert_eq!(offset_for_index(0, &plan), 0.0);
        assert_eq!(offset_for_index(41, &plan), 1000.0);
        assert_eq!(offset_for_index(99, &plan), plan.max_scroll_offset());
        assert_eq!(offset_for_index(5_000, &plan), plan.max_scroll_offset());
        assert_eq!(offset_for_index(3, &grid(0)), 0.0);
    }

    #[test]
    fn index_at_hits_items() {
        let plan = grid(10);
        assert_eq!(index_at(10.0, 10.0, &plan), Some(0));
        assert_eq!(index_at(650.0, 150.0, &plan), Some(7));
        assert_eq!(index_at(250.0, 250.0, &plan), Some(9));
        // row 2, column 2 is past the last item
        assert_eq!(index_at(450.0, 250.0, &plan), None);
        assert_eq!(index_at(900.0, 10.0, &plan), None);
        assert_eq!(index_at(-1.0, 10.0, &plan), None);
    }

    #[test]
    fn overlaps_is_symmetric() {
        let plan = grid(1000);
        let a = compute_visible_range(0.0, 800.0, &plan, 2).unwrap();
        let b = compute_visible_range(500.0, 800.0, &plan, 2).unwrap();
        let c = compute_visible_range(5_000.0, 800.0, &plan, 0).unwrap();
        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }
}
