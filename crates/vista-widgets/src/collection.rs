#![forbid(unsafe_code)]

//! The collection view: one recompute path for every host event.
//!
//! [`CollectionView`] owns the catalog, the viewport, the recycler, the
//! selection, and the pagination trigger. Every event goes through the same
//! pass, always in this order:
//!
//! 1. layout (only when width, height, or catalog length may have changed)
//! 2. window
//! 3. recycler reconcile
//! 4. pagination evaluation
//!
//! Nothing else mutates slots, so no event can observe a half-updated view.
//!
//! # Example
//!
//! ```
//! use vista_core::event::CollectionEvent;
//! use vista_core::geometry::Size;
//! use vista_widgets::{CollectionConfig, CollectionView, RenderPhase};
//!
//! let items: Vec<u64> = (0..10_000).collect();
//! let mut view = CollectionView::new(
//!     CollectionConfig::default(),
//!     items,
//!     false,
//!     |item: &u64, selected: bool| format!("{item}{}", if selected { "*" } else { "" }),
//! );
//! assert_eq!(view.phase(), RenderPhase::Unmeasured);
//!
//! let report = view.handle(CollectionEvent::Resize(Size::new(800.0, 800.0)));
//! let range = report.range.unwrap();
//! assert_eq!((range.first_index, range.last_index), (0, 39));
//! assert_eq!(view.slots().count(), 40);
//! ```

use vista_core::Keyed;
use vista_core::event::{CollectionEvent, RecomputeReason};
use vista_core::geometry::{Viewport, sanitize};
use vista_layout::LayoutPlan;
use vista_layout::window::{VisibleRange, compute_visible_range, offset_for_index};

use crate::ItemRenderer;
use crate::catalog::Catalog;
use crate::config::CollectionConfig;
use crate::pagination::{
    EndProximity, LoadError, LoadOutcome, LoadRequest, LoadState, LoadTicket, Page,
    PaginationTrigger,
};
use crate::recycler::{ReconcileReport, Recycler, RecyclerStats, Slot};
use crate::selection::SelectionSet;

type LoadMoreFn = Box<dyn FnMut(&LoadRequest)>;
type SelectionChangeFn<Id> = Box<dyn FnMut(&SelectionSet<Id>)>;

/// What the view is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RenderPhase {
    /// No positive container size yet. Nothing is rendered.
    #[default]
    Unmeasured,
    /// Measured, but the catalog is empty. Show the empty-state placeholder.
    Empty,
    /// Measured with items.
    Items,
}

/// Result of one recompute pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecomputeReport {
    /// What triggered the pass.
    pub reasons: RecomputeReason,
    /// Phase after the pass.
    pub phase: RenderPhase,
    /// Window after the pass.
    pub range: Option<VisibleRange>,
    /// Slot churn.
    pub reconcile: ReconcileReport,
    /// A page request issued by this pass. Already passed to `on_load_more`.
    pub load_request: Option<LoadRequest>,
}

impl RecomputeReport {
    fn idle(reasons: RecomputeReason, phase: RenderPhase) -> Self {
        Self {
            reasons,
            phase,
            range: None,
            reconcile: ReconcileReport::default(),
            load_request: None,
        }
    }
}

/// A virtualized grid or list over a [`Catalog`].
pub struct CollectionView<T, R>
where
    T: Keyed,
    R: ItemRenderer<T>,
{
    config: CollectionConfig,
    catalog: Catalog<T>,
    viewport: Viewport,
    layout: LayoutPlan,
    layout_stale: bool,
    range: Option<VisibleRange>,
    phase: RenderPhase,
    recycler: Recycler<T::Id, R::Node>,
    selection: SelectionSet<T::Id>,
    pagination: PaginationTrigger,
    renderer: R,
    on_load_more: Option<LoadMoreFn>,
    on_selection_change: Option<SelectionChangeFn<T::Id>>,
    mounted: bool,
    last_report: Option<RecomputeReport>,
}

impl<T, R> CollectionView<T, R>
where
    T: Keyed,
    R: ItemRenderer<T>,
{
    /// Create a mounted view. Nothing renders until the first
    /// [`CollectionEvent::Resize`] with a positive size.
    pub fn new(config: CollectionConfig, items: Vec<T>, has_more: bool, renderer: R) -> Self {
        Self {
            pagination: PaginationTrigger::new(config.threshold_rows, has_more),
            config,
            catalog: Catalog::from_vec(items),
            viewport: Viewport::default(),
            layout: LayoutPlan::default(),
            layout_stale: true,
            range: None,
            phase: RenderPhase::Unmeasured,
            recycler: Recycler::new(),
            selection: SelectionSet::new(),
            renderer,
            on_load_more: None,
            on_selection_change: None,
            mounted: true,
            last_report: None,
        }
    }

    /// Called with every [`LoadRequest`] a pass issues.
    #[must_use]
    pub fn with_on_load_more<F>(mut self, f: F) -> Self
    where
        F: FnMut(&LoadRequest) + 'static,
    {
        self.set_on_load_more(f);
        self
    }

    /// Replace the load-more callback on an existing view.
    pub fn set_on_load_more<F>(&mut self, f: F)
    where
        F: FnMut(&LoadRequest) + 'static,
    {
        self.on_load_more = Some(Box::new(f));
    }

    /// Called after every selection mutation, once slots reflect it.
    #[must_use]
    pub fn with_on_selection_change<F>(mut self, f: F) -> Self
    where
        F: FnMut(&SelectionSet<T::Id>) + 'static,
    {
        self.set_on_selection_change(f);
        self
    }

    /// Replace the selection-change callback on an existing view.
    pub fn set_on_selection_change<F>(&mut self, f: F)
    where
        F: FnMut(&SelectionSet<T::Id>) + 'static,
    {
        self.on_selection_change = Some(Box::new(f));
    }

    // --- events ---

    /// Apply a host event and run the pass.
    ///
    /// Any host event releases a pagination stall left by an empty page.
    pub fn handle(&mut self, event: CollectionEvent) -> RecomputeReport {
        self.pagination.resume();
        match event {
            CollectionEvent::Resize(size) => {
                self.viewport = self.viewport.with_size(size);
                self.layout_stale = true;
            }
            CollectionEvent::Scroll(offset) => {
                self.viewport = self.viewport.with_scroll_offset(offset);
            }
            CollectionEvent::ScrollBy(delta) => {
                let target = sanitize(sanitize(self.viewport.scroll_offset) + delta);
                let offset = target.min(self.layout.max_scroll_offset());
                self.viewport = self.viewport.with_scroll_offset(offset);
            }
            CollectionEvent::CatalogChanged => {
                self.layout_stale = true;
            }
        }
        self.run(event.reasons())
    }

    /// Run a full pass without changing any input.
    pub fn recompute(&mut self) -> RecomputeReport {
        self.layout_stale = true;
        self.run(RecomputeReason::all())
    }

    /// Jump to an absolute offset.
    pub fn scroll_to(&mut self, offset: f32) -> RecomputeReport {
        self.handle(CollectionEvent::Scroll(offset))
    }

    /// Scroll so the row holding `index` is at the top, clamped to the end.
    pub fn scroll_to_index(&mut self, index: usize) -> RecomputeReport {
        self.refresh_layout();
        let offset = offset_for_index(index, &self.layout);
        self.handle(CollectionEvent::Scroll(offset))
    }

    fn refresh_layout(&mut self) {
        if self.layout_stale || self.layout.item_count != self.catalog.len() {
            self.layout = LayoutPlan::compute(
                &self.config.layout,
                self.viewport.size(),
                self.catalog.len(),
            );
            self.layout_stale = false;
        }
    }

    fn run(&mut self, reasons: RecomputeReason) -> RecomputeReport {
        let _span = vista_core::debug_span!(
            "collection_recompute",
            reasons = ?reasons,
            items = self.catalog.len()
        )
        .entered();

        if !self.mounted {
            return RecomputeReport::idle(reasons, self.phase);
        }

        if !self.viewport.is_measured() {
            vista_core::debug!(
                width = self.viewport.width,
                height = self.viewport.height,
                "viewport not measured, rendering nothing"
            );
            self.phase = RenderPhase::Unmeasured;
            self.range = None;
            let reconcile = self.recycler.reconcile(
                None,
                &self.catalog,
                &self.layout,
                &self.selection,
                &mut self.renderer,
            );
            let report = RecomputeReport {
                reconcile,
                ..RecomputeReport::idle(reasons, self.phase)
            };
            self.last_report = Some(report);
            return report;
        }

        // 1. layout
        if reasons.needs_layout() {
            self.layout_stale = true;
        }
        self.refresh_layout();

        // 2. window
        self.range = compute_visible_range(
            self.viewport.scroll_offset,
            self.viewport.height,
            &self.layout,
            self.config.overscan_rows,
        );
        self.phase = if self.catalog.is_empty() {
            RenderPhase::Empty
        } else {
            RenderPhase::Items
        };

        // 3. reconcile
        let reconcile = self.recycler.reconcile(
            self.range.as_ref(),
            &self.catalog,
            &self.layout,
            &self.selection,
            &mut self.renderer,
        );

        // 4. pagination
        let load_request = EndProximity::from_window(self.range.as_ref(), &self.layout)
            .and_then(|proximity| self.pagination.evaluate(proximity, self.catalog.len()));
        if let Some(request) = load_request.as_ref()
            && let Some(on_load_more) = self.on_load_more.as_mut()
        {
            on_load_more(request);
        }

        vista_core::debug!(
            columns = self.layout.columns,
            first = self.range.map_or(0, |r| r.first_index),
            last = self.range.map_or(0, |r| r.last_index),
            rendered = reconcile.rendered,
            load = load_request.is_some(),
            "recomputed"
        );

        let report = RecomputeReport {
            reasons,
            phase: self.phase,
            range: self.range,
            reconcile,
            load_request,
        };
        self.last_report = Some(report);
        report
    }

    // --- catalog edits ---

    /// Swap the whole catalog (new sort order, new filter).
    ///
    /// Any in-flight load is superseded, every live slot is redrawn, and the
    /// selection is kept.
    pub fn replace_catalog(&mut self, items: Vec<T>, has_more: bool) -> RecomputeReport {
        self.catalog.replace(items);
        self.pagination.reset(has_more);
        self.recycler.invalidate_all();
        self.layout_stale = true;
        self.run(RecomputeReason::CATALOG)
    }

    /// Edit one record in place. Only its slot is redrawn; the window is not
    /// recomputed unless the edit changed the record's identifier.
    pub fn update_item<F>(&mut self, id: &T::Id, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(index) = self.catalog.update(id, f) else {
            return false;
        };
        let Some(item) = self.catalog.get(index) else {
            return false;
        };
        let new_id = item.id();
        if new_id != *id {
            self.recycler.release_slot(id);
            self.run(RecomputeReason::CATALOG);
            return true;
        }
        let selected = self.selection.is_selected(&new_id);
        self.recycler.refresh(item, selected, &mut self.renderer);
        true
    }

    /// Remove a record. Later records shift up and the window re-clamps.
    pub fn remove_item(&mut self, id: &T::Id) -> Option<T> {
        let removed = self.catalog.remove(id)?;
        self.run(RecomputeReason::CATALOG);
        Some(removed)
    }

    // --- selection ---

    /// Flip selection of `id`. Returns the new state.
    pub fn toggle_selection(&mut self, id: T::Id) -> bool {
        let selected = self.selection.toggle(id);
        self.selection_changed();
        selected
    }

    /// Select every record in the catalog, rendered or not.
    pub fn select_all(&mut self) -> usize {
        let added = self.selection.select_all(self.catalog.ids());
        if added > 0 {
            self.selection_changed();
        }
        added
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.clear();
        if changed {
            self.selection_changed();
        }
        changed
    }

    /// Replace the whole selection, e.g. with one persisted by the host.
    /// Rendered slots whose state changed are redrawn.
    pub fn restore_selection(&mut self, selection: SelectionSet<T::Id>) {
        self.selection = selection;
        self.selection_changed();
    }

    /// Whether `id` is selected, rendered or not.
    #[must_use]
    pub fn is_selected(&self, id: &T::Id) -> bool {
        self.selection.is_selected(id)
    }

    fn selection_changed(&mut self) {
        if self.mounted {
            self.recycler
                .resync_selection(&self.catalog, &self.selection, &mut self.renderer);
        }
        if let Some(notify) = self.on_selection_change.as_mut() {
            notify(&self.selection);
        }
    }

    // --- pagination ---

    /// Hand back the result for a [`LoadRequest`].
    ///
    /// Applied pages trigger a pass, which may issue the next request only
    /// if the page added something. A page with nothing new stalls the
    /// trigger until the next host event or [`CollectionView::retry_load`].
    /// Failures leave the catalog untouched and are returned; the trigger
    /// stays quiet until [`CollectionView::retry_load`].
    pub fn complete_load<E>(
        &mut self,
        ticket: LoadTicket,
        result: Result<Page<T>, E>,
    ) -> Result<LoadOutcome, LoadError<E>> {
        let outcome = self.pagination.complete(ticket, result, &mut self.catalog)?;
        if outcome.is_applied() && self.mounted {
            self.run(RecomputeReason::LOAD);
        }
        Ok(outcome)
    }

    /// Drop the request in flight without a result. The trigger treats it
    /// as a failure and waits for [`CollectionView::retry_load`].
    pub fn abandon_load(&mut self, ticket: LoadTicket) -> bool {
        self.pagination.abandon(ticket)
    }

    /// Clear a load failure or stall and re-evaluate.
    pub fn retry_load(&mut self) -> RecomputeReport {
        self.pagination.retry();
        self.run(RecomputeReason::LOAD)
    }

    /// Override `has_more` and re-evaluate.
    pub fn set_has_more(&mut self, has_more: bool) -> RecomputeReport {
        self.pagination.set_has_more(has_more);
        self.run(RecomputeReason::LOAD)
    }

    // --- lifecycle ---

    /// Drop all slots and supersede any in-flight load. Later events and
    /// late load results are ignored until [`CollectionView::mount`].
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.pagination.invalidate();
        self.recycler.clear();
        self.range = None;
        vista_core::debug!(generation = self.pagination.generation(), "unmounted");
    }

    /// Re-attach after [`CollectionView::unmount`] and run a full pass.
    pub fn mount(&mut self) -> RecomputeReport {
        self.mounted = true;
        self.recompute()
    }

    // --- accessors ---

    /// Whether the view is between `mount` and `unmount`.
    #[inline]
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// What the last pass rendered.
    #[inline]
    #[must_use]
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// The records, in display order.
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Catalog<T> {
        &self.catalog
    }

    /// Current scroll offset and size.
    #[inline]
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Layout from the last measured pass.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> &LayoutPlan {
        &self.layout
    }

    /// Window from the last pass, overscan included.
    #[inline]
    #[must_use]
    pub fn visible_range(&self) -> Option<VisibleRange> {
        self.range
    }

    /// Settings the view was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Selected identifiers.
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &SelectionSet<T::Id> {
        &self.selection
    }

    /// `has_more` and `is_loading`.
    #[inline]
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.pagination.state()
    }

    /// The pagination trigger, for stats and latch state.
    #[inline]
    #[must_use]
    pub fn pagination(&self) -> &PaginationTrigger {
        &self.pagination
    }

    /// Slot pool counters.
    #[must_use]
    pub fn recycler_stats(&self) -> RecyclerStats {
        self.recycler.stats()
    }

    /// Slot bound to `id`, if it is in the window.
    #[must_use]
    pub fn slot_for(&self, id: &T::Id) -> Option<&Slot<T::Id, R::Node>> {
        self.recycler.slot_for(id)
    }

    /// Live slots in catalog order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot<T::Id, R::Node>> + '_ {
        self.recycler.live_slots().into_iter()
    }

    /// The item renderer.
    #[inline]
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the item renderer.
    #[inline]
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Report from the most recent pass.
    #[inline]
    #[must_use]
    pub fn last_report(&self) -> Option<&RecomputeReport> {
        self.last_report.as_ref()
    }
}
