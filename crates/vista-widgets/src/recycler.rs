#![forbid(unsafe_code)]

//! Identity-keyed render slots.
//!
//! The recycler maps item identifiers to [`Slot`]s. A slot bound to an
//! identifier stays bound while that identifier remains in the window, so an
//! item visible in two consecutive windows keeps the same [`SlotId`] and the
//! same render node. Slots that leave the window go to a free list; their
//! binding is cleared but the node is kept, and the next binding redraws it
//! through [`ItemRenderer::update`].
//!
//! # Invariants
//!
//! - An identifier is bound to at most one slot.
//! - A slot is either bound (in `bindings`) or pooled (in `free_list`), never both.
//! - When two window indices carry the same identifier, the later index wins.

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use vista_core::Keyed;
use vista_core::geometry::SlotRect;
use vista_layout::LayoutPlan;
use vista_layout::window::{VisibleRange, slot_rect};

use crate::ItemRenderer;
use crate::catalog::Catalog;
use crate::selection::SelectionSet;

/// Stable handle to a slot. Handles are never reassigned to a different
/// slot, only the slot's binding changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    /// Raw position in the slot arena.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// How [`Recycler::acquire_slot`] satisfied a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// The identifier already owned this slot.
    Retained,
    /// A pooled slot was rebound.
    Reused,
    /// A new slot was allocated.
    Created,
}

/// One render slot.
#[derive(Debug, Clone)]
pub struct Slot<Id, N> {
    slot_id: SlotId,
    item_id: Option<Id>,
    index: usize,
    rect: SlotRect,
    selected: bool,
    dirty: bool,
    node: Option<N>,
}

impl<Id, N> Slot<Id, N> {
    fn empty(slot_id: SlotId) -> Self {
        Self {
            slot_id,
            item_id: None,
            index: 0,
            rect: SlotRect::default(),
            selected: false,
            dirty: false,
            node: None,
        }
    }

    /// This slot's handle.
    #[inline]
    #[must_use]
    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    /// Identifier currently bound, `None` while pooled.
    #[inline]
    #[must_use]
    pub fn item_id(&self) -> Option<&Id> {
        self.item_id.as_ref()
    }

    /// Catalog index the slot was last positioned for.
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Absolute position in content coordinates.
    #[inline]
    #[must_use]
    pub fn rect(&self) -> SlotRect {
        self.rect
    }

    /// Selected state the node was last drawn with.
    #[inline]
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// The render node, if one was ever drawn.
    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    /// Whether the slot holds an item.
    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.item_id.is_some()
    }
}

/// Counts from one [`Recycler::reconcile`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Identifiers bound to a slot during this pass.
    pub acquired: usize,
    /// Identifiers that kept their slot.
    pub retained: usize,
    /// Slots returned to the pool.
    pub released: usize,
    /// Renderer calls (create or update).
    pub rendered: usize,
}

/// Running diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecyclerStats {
    /// Slots currently bound.
    pub live: usize,
    /// Slots waiting in the pool.
    pub pooled: usize,
    /// Slots ever allocated, including any dropped by [`Recycler::clear`].
    pub created: u64,
    /// Times a pooled slot was rebound.
    pub reused: u64,
    /// Renderer calls.
    pub renders: u64,
}

/// Slot arena plus identifier bindings and a free list.
#[derive(Debug, Clone)]
pub struct Recycler<Id, N> {
    slots: Vec<Slot<Id, N>>,
    bindings: FxHashMap<Id, SlotId>,
    free_list: Vec<SlotId>,
    created: u64,
    reused: u64,
    renders: u64,
}

impl<Id, N> Default for Recycler<Id, N>
where
    Id: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, N> Recycler<Id, N>
where
    Id: Clone + Eq + Hash,
{
    /// Create an empty recycler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            bindings: FxHashMap::default(),
            free_list: Vec::new(),
            created: 0,
            reused: 0,
            renders: 0,
        }
    }

    /// Bind `id` to a slot.
    ///
    /// Returns the existing slot if `id` is already bound; otherwise pops
    /// the free list, and only allocates when the pool is empty. A newly
    /// bound slot is marked dirty so the next reconcile draws it.
    pub fn acquire_slot(&mut self, id: Id) -> (SlotId, Acquire) {
        if let Some(&slot_id) = self.bindings.get(&id) {
            return (slot_id, Acquire::Retained);
        }

        let (slot_id, how) = match self.free_list.pop() {
            Some(slot_id) => {
                self.reused += 1;
                (slot_id, Acquire::Reused)
            }
            None => {
                let slot_id = SlotId(self.slots.len() as u32);
                self.slots.push(Slot::empty(slot_id));
                self.created += 1;
                (slot_id, Acquire::Created)
            }
        };

        let slot = &mut self.slots[slot_id.0 as usize];
        slot.item_id = Some(id.clone());
        slot.dirty = true;
        self.bindings.insert(id, slot_id);
        (slot_id, how)
    }

    /// Unbind `id` and return its slot to the pool.
    pub fn release_slot(&mut self, id: &Id) -> Option<SlotId> {
        let slot_id = self.bindings.remove(id)?;
        if let Some(slot) = self.slots.get_mut(slot_id.0 as usize) {
            slot.item_id = None;
            slot.dirty = false;
            slot.selected = false;
        }
        self.free_list.push(slot_id);
        Some(slot_id)
    }

    /// Release every bound slot. Nodes stay pooled.
    pub fn release_all(&mut self) -> usize {
        let ids: Vec<Id> = self.bindings.keys().cloned().collect();
        for id in &ids {
            self.release_slot(id);
        }
        ids.len()
    }

    /// Drop every slot and node, pooled or not. Counters keep running.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.bindings.clear();
        self.free_list.clear();
    }

    /// Mark the slot for `id` dirty. Returns `false` if `id` is not bound.
    pub fn invalidate(&mut self, id: &Id) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Mark every bound slot dirty.
    pub fn invalidate_all(&mut self) {
        for slot_id in self.bindings.values() {
            if let Some(slot) = self.slots.get_mut(slot_id.0 as usize) {
                slot.dirty = true;
            }
        }
    }

    /// Redraw the slot bound to `item`, if any, without touching any other
    /// slot. Returns whether a render happened.
    pub fn refresh<T, R>(&mut self, item: &T, selected: bool, renderer: &mut R) -> bool
    where
        T: Keyed<Id = Id>,
        R: ItemRenderer<T, Node = N>,
    {
        let id = item.id();
        let Some(&slot_id) = self.bindings.get(&id) else {
            return false;
        };
        let slot = &mut self.slots[slot_id.0 as usize];
        draw(slot, item, selected, renderer);
        self.renders += 1;
        true
    }

    /// Bring bound slots in line with `range`.
    ///
    /// Identifiers that left the window are released first, so their slots
    /// are available to the identifiers entering it. Each slot in the
    /// window is positioned from its index alone and redrawn only when it
    /// was newly bound, dirty, or its selected state changed.
    pub fn reconcile<T, R>(
        &mut self,
        range: Option<&VisibleRange>,
        catalog: &Catalog<T>,
        layout: &LayoutPlan,
        selection: &SelectionSet<Id>,
        renderer: &mut R,
    ) -> ReconcileReport
    where
        T: Keyed<Id = Id>,
        R: ItemRenderer<T, Node = N>,
        Id: std::fmt::Debug,
    {
        let _span = vista_core::debug_span!(
            "recycler_reconcile",
            first = range.map_or(0, |r| r.first_index),
            last = range.map_or(0, |r| r.last_index),
            live = self.bindings.len()
        )
        .entered();

        let mut report = ReconcileReport::default();

        // Later indices overwrite earlier ones on identifier collision.
        let mut wanted: FxHashMap<Id, usize> = FxHashMap::default();
        if let Some(range) = range {
            wanted.reserve(range.len());
            for index in range.indices() {
                if let Some(item) = catalog.get(index) {
                    wanted.insert(item.id(), index);
                }
            }
        }

        let stale: SmallVec<[Id; 16]> = self
            .bindings
            .keys()
            .filter(|id| !wanted.contains_key(*id))
            .cloned()
            .collect();
        for id in &stale {
            self.release_slot(id);
        }
        report.released = stale.len();

        let Some(range) = range else {
            vista_core::trace!(released = report.released, "window empty");
            return report;
        };

        for index in range.indices() {
            let Some(item) = catalog.get(index) else {
                continue;
            };
            let id = item.id();
            if wanted.get(&id) != Some(&index) {
                vista_core::trace!(?id, index, "identifier collision, later index wins");
                continue;
            }

            let (slot_id, how) = self.acquire_slot(id.clone());
            match how {
                Acquire::Retained => report.retained += 1,
                Acquire::Reused | Acquire::Created => report.acquired += 1,
            }

            let selected = selection.is_selected(&id);
            let slot = &mut self.slots[slot_id.0 as usize];
            slot.index = index;
            slot.rect = slot_rect(index, layout);
            if slot.dirty || slot.selected != selected || slot.node.is_none() {
                draw(slot, item, selected, renderer);
                report.rendered += 1;
            }
        }
        self.renders += report.rendered as u64;

        vista_core::trace!(
            acquired = report.acquired,
            retained = report.retained,
            released = report.released,
            rendered = report.rendered,
            "reconciled"
        );
        report
    }

    /// Redraw bound slots whose selected state disagrees with `selection`.
    ///
    /// Used after a selection change that happens between render passes.
    pub fn resync_selection<T, R>(
        &mut self,
        catalog: &Catalog<T>,
        selection: &SelectionSet<Id>,
        renderer: &mut R,
    ) -> usize
    where
        T: Keyed<Id = Id>,
        R: ItemRenderer<T, Node = N>,
    {
        let mut rendered = 0;
        for slot_id in self.bindings.values() {
            let slot = &mut self.slots[slot_id.0 as usize];
            let Some(id) = slot.item_id.as_ref() else {
                continue;
            };
            let selected = selection.is_selected(id);
            if slot.selected == selected {
                continue;
            }
            let Some(item) = catalog.get(slot.index).filter(|item| item.id() == *id) else {
                slot.dirty = true;
                continue;
            };
            draw(slot, item, selected, renderer);
            rendered += 1;
        }
        self.renders += rendered as u64;
        rendered
    }

    /// Slot bound to `id`.
    #[must_use]
    pub fn slot_for(&self, id: &Id) -> Option<&Slot<Id, N>> {
        let slot_id = self.bindings.get(id)?;
        self.slots.get(slot_id.0 as usize)
    }

    fn slot_mut(&mut self, id: &Id) -> Option<&mut Slot<Id, N>> {
        let slot_id = self.bindings.get(id)?;
        self.slots.get_mut(slot_id.0 as usize)
    }

    /// Slot by handle, bound or pooled.
    #[must_use]
    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot<Id, N>> {
        self.slots.get(slot_id.0 as usize)
    }

    /// Whether `id` currently owns a slot.
    #[inline]
    #[must_use]
    pub fn is_bound(&self, id: &Id) -> bool {
        self.bindings.contains_key(id)
    }

    /// Bound slots sorted by catalog index.
    #[must_use]
    pub fn live_slots(&self) -> Vec<&Slot<Id, N>> {
        let mut live: Vec<&Slot<Id, N>> = self
            .bindings
            .values()
            .filter_map(|slot_id| self.slots.get(slot_id.0 as usize))
            .collect();
        live.sort_unstable_by_key(|slot| slot.index);
        live
    }

    /// Number of bound slots.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.bindings.len()
    }

    /// Snapshot of the running counters.
    #[must_use]
    pub fn stats(&self) -> RecyclerStats {
        RecyclerStats {
            live: self.bindings.len(),
            pooled: self.free_list.len(),
            created: self.created,
            reused: self.reused,
            renders: self.renders,
        }
    }
}

fn draw<T, R, Id, N>(slot: &mut Slot<Id, N>, item: &T, selected: bool, renderer: &mut R)
where
    R: ItemRenderer<T, Node = N>,
{
    match slot.node.as_mut() {
        Some(node) => renderer.update(node, item, selected),
        None => slot.node = Some(renderer.create(item, selected)),
    }
    slot.selected = selected;
    slot.dirty = false;
}
