#![forbid(unsafe_code)]

//! Ordered item store with an identifier index.
//!
//! The catalog is the only shared mutable resource in a collection view.
//! Writers are the pagination completion path and explicit caller edits;
//! layout, windowing, and the recycler only read it.
//!
//! Duplicate identifiers are tolerated: both records stay in order, and the
//! index points at the later one (last write wins).

use rustc_hash::FxHashMap;
use vista_core::Keyed;

/// Counts from an [`Catalog::append_unique`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppendReport {
    /// Items added to the end of the catalog.
    pub appended: usize,
    /// Items dropped because their identifier was already present.
    pub duplicates: usize,
}

/// The ordered collection of records to display.
#[derive(Debug, Clone)]
pub struct Catalog<T: Keyed> {
    items: Vec<T>,
    index: FxHashMap<T::Id, usize>,
}

impl<T: Keyed> Default for Catalog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> Catalog<T> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Wrap an existing vector, keeping its order and any duplicates.
    #[must_use]
    pub fn from_vec(items: Vec<T>) -> Self {
        let mut catalog = Self {
            items,
            index: FxHashMap::default(),
        };
        catalog.rebuild_index();
        catalog
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        self.index.reserve(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            self.index.insert(item.id(), i);
        }
    }

    /// Number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Record at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Record with identifier `id`.
    #[must_use]
    pub fn get_by_id(&self, id: &T::Id) -> Option<&T> {
        self.index.get(id).and_then(|&i| self.items.get(i))
    }

    /// Position of `id`.
    #[inline]
    #[must_use]
    pub fn index_of(&self, id: &T::Id) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Whether any record carries `id`.
    #[inline]
    #[must_use]
    pub fn contains_id(&self, id: &T::Id) -> bool {
        self.index.contains_key(id)
    }

    /// Records in order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterate records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Iterate identifiers in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = T::Id> + '_ {
        self.items.iter().map(Keyed::id)
    }

    /// Append records whose identifiers are not yet present.
    ///
    /// Duplicates inside `items` itself are dropped too, so a page that
    /// overlaps the existing tail (or itself) never produces repeated rows.
    pub fn append_unique<I>(&mut self, items: I) -> AppendReport
    where
        I: IntoIterator<Item = T>,
    {
        let mut report = AppendReport::default();
        for item in items {
            let id = item.id();
            if self.index.contains_key(&id) {
                report.duplicates += 1;
                continue;
            }
            self.index.insert(id, self.items.len());
            self.items.push(item);
            report.appended += 1;
        }
        report
    }

    /// Edit a record in place.
    ///
    /// Returns the record's position. If the closure changes the identifier
    /// the index is rebuilt so lookups stay consistent.
    pub fn update<F>(&mut self, id: &T::Id, f: F) -> Option<usize>
    where
        F: FnOnce(&mut T),
    {
        let pos = self.index_of(id)?;
        let item = &mut self.items[pos];
        f(item);
        if item.id() != *id {
            self.rebuild_index();
        }
        Some(pos)
    }

    /// Remove the record with identifier `id`, shifting later records up.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let pos = self.index_of(id)?;
        let removed = self.items.remove(pos);
        self.rebuild_index();
        Some(removed)
    }

    /// Swap in a whole new ordering. Returns the previous records.
    pub fn replace(&mut self, items: Vec<T>) -> Vec<T> {
        let old = std::mem::replace(&mut self.items, items);
        self.rebuild_index();
        old
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Unwrap into the backing vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Keyed> FromIterator<T> for Catalog<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T: Keyed> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Row = (u32, &'static str);

    fn sample() -> Catalog<Row> {
        Catalog::from_vec(vec![(1, "a"), (2, "b"), (3, "c")])
    }

    #[test]
    fn lookup_by_id_and_index() {
        let c = sample();
        assert_eq!(c.len(), 3);
        assert_eq!(c.index_of(&2), Some(1));
        assert_eq!(c.get_by_id(&3), Some(&(3, "c")));
        assert!(c.get_by_id(&9).is_none());
    }

    #[test]
    fn append_unique_dedupes_against_catalog_and_page() {
        let mut c = sample();
        let report = c.append_unique(vec![(3, "dup"), (4, "d"), (4, "d2"), (5, "e")]);
        assert_eq!(report.appended, 2);
        assert_eq!(report.duplicates, 2);
        assert_eq!(c.ids().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(c.get_by_id(&4), Some(&(4, "d")));
    }

    #[test]
    fn update_in_place_keeps_position() {
        let mut c = sample();
        let pos = c.update(&2, |row| row.1 = "renamed");
        assert_eq!(pos, Some(1));
        assert_eq!(c.get(1), Some(&(2, "renamed")));
        assert_eq!(c.update(&42, |_| {}), None);
    }

    #[test]
    fn update_that_changes_id_reindexes() {
        let mut c = sample();
        c.update(&2, |row| row.0 = 20);
        assert_eq!(c.index_of(&20), Some(1));
        assert_eq!(c.index_of(&2), None);
    }

    #[test]
    fn remove_shifts_and_reindexes() {
        let mut c = sample();
        assert_eq!(c.remove(&1), Some((1, "a")));
        assert_eq!(c.index_of(&3), Some(1));
        assert_eq!(c.len(), 2);
        assert_eq!(c.remove(&1), None);
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let c = Catalog::from_vec(vec![(7u32, "first"), (8, "x"), (7, "second")]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.index_of(&7), Some(2));
        assert_eq!(c.get_by_id(&7), Some(&(7, "second")));
    }

    #[test]
    fn replace_returns_old_records() {
        let mut c = sample();
        let old = c.replace(vec![(9, "z")]);
        assert_eq!(old.len(), 3);
        assert_eq!(c.len(), 1);
        assert!(!c.contains_id(&1));
        assert!(c.contains_id(&9));
    }

    #[test]
    fn collect_into_catalog() {
        let c: Catalog<u64> = (0..5u64).collect();
        assert_eq!(c.len(), 5);
        assert_eq!(c.index_of(&4), Some(4));
        assert_eq!((&c).into_iter().count(), 5);
    }
}
