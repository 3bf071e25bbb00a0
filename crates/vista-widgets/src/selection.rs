#![forbid(unsafe_code)]

//! Selection tracking.
//!
//! A plain identifier set. It knows nothing about windowing: an item can be
//! selected while it has no render slot, and the recycler reads
//! [`SelectionSet::is_selected`] when that item scrolls back into view.
//!
//! Iteration order is unspecified. Use [`SelectionSet::ordered_in`] when the
//! caller needs catalog order.

use std::hash::Hash;

use rustc_hash::FxHashSet;
use vista_core::Keyed;

use crate::catalog::Catalog;

/// Set of selected identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SelectionSet<Id>
where
    Id: Eq + Hash,
{
    ids: FxHashSet<Id>,
}

impl<Id: Eq + Hash> Default for SelectionSet<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Eq + Hash> SelectionSet<Id> {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: FxHashSet::default(),
        }
    }

    /// Flip membership of `id`. Returns the new state.
    pub fn toggle(&mut self, id: Id) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Add `id`. Returns `true` if it was not already selected.
    pub fn select(&mut self, id: Id) -> bool {
        self.ids.insert(id)
    }

    /// Remove `id`. Returns `true` if it was selected.
    pub fn deselect(&mut self, id: &Id) -> bool {
        self.ids.remove(id)
    }

    /// Select every identifier yielded. Returns how many were newly added.
    ///
    /// Pass the whole catalog's identifiers, not the windowed subset.
    pub fn select_all<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = Id>,
    {
        let before = self.ids.len();
        self.ids.extend(ids);
        self.ids.len() - before
    }

    /// Deselect everything. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.ids.is_empty();
        self.ids.clear();
        had_any
    }

    /// Membership test.
    #[inline]
    #[must_use]
    pub fn is_selected(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected identifiers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if nothing is selected.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate selected identifiers in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Id> {
        self.ids.iter()
    }

    /// Selected identifiers in catalog order. Identifiers absent from the
    /// catalog are skipped.
    #[must_use]
    pub fn ordered_in<T>(&self, catalog: &Catalog<T>) -> Vec<Id>
    where
        T: Keyed<Id = Id>,
        Id: Clone + std::fmt::Debug,
    {
        if self.ids.is_empty() {
            return Vec::new();
        }
        catalog.ids().filter(|id| self.ids.contains(id)).collect()
    }

    /// Drop identifiers that no longer exist in `catalog`. Returns how many
    /// were removed.
    pub fn retain_present<T>(&mut self, catalog: &Catalog<T>) -> usize
    where
        T: Keyed<Id = Id>,
        Id: Clone + std::fmt::Debug,
    {
        let before = self.ids.len();
        self.ids.retain(|id| catalog.contains_id(id));
        before - self.ids.len()
    }
}

impl<Id: Eq + Hash> FromIterator<Id> for SelectionSet<Id> {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
