use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::types::{Cell, CellRect};

/// Sparse map from grid cell to the items overlapping it.
///
/// Cells are created on first insert and dropped as soon as they empty, so the
/// number of entries is the number of non-empty cells.
#[derive(Clone, Debug)]
pub struct CellIndex<I> {
    cells: HashMap<Cell, HashSet<I>>,
}

impl<I> Default for CellIndex<I> {
    fn default() -> Self {
        Self { cells: HashMap::new() }
    }
}

impl<I: Clone + Eq + Hash> CellIndex<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` to `cell`. Returns false if it was already there.
    pub fn insert(&mut self, id: &I, cell: Cell) -> bool {
        self.cells.entry(cell).or_default().insert(id.clone())
    }

    /// Remove `id` from `cell`. Returns false if it was not there.
    pub fn remove(&mut self, id: &I, cell: Cell) -> bool {
        let Some(items) = self.cells.get_mut(&cell) else {
            return false;
        };
        let removed = items.remove(id);
        if items.is_empty() {
            self.cells.remove(&cell);
        }
        removed
    }

    pub fn insert_rect(&mut self, id: &I, cr: CellRect) {
        for cell in cr.cells() {
            self.insert(id, cell);
        }
    }

    pub fn remove_rect(&mut self, id: &I, cr: CellRect) {
        for cell in cr.cells() {
            self.remove(id, cell);
        }
    }

    /// Move `id` from `old` coverage to `new`, touching only the cells that
    /// leave or enter coverage.
    pub fn move_rect(&mut self, id: &I, old: CellRect, new: CellRect) {
        if old == new {
            return;
        }
        for cell in old.cells().filter(|c| !new.contains(*c)) {
            self.remove(id, cell);
        }
        for cell in new.cells().filter(|c| !old.contains(*c)) {
            self.insert(id, cell);
        }
    }

    pub fn items_in(&self, cell: Cell) -> Option<&HashSet<I>> {
        self.cells.get(&cell)
    }

    /// Number of non-empty cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Total item/cell pairs.
    pub fn memberships(&self) -> usize {
        self.cells.values().map(HashSet::len).sum()
    }

    /// Cells currently holding `id`, sorted. Linear in the number of cells.
    pub fn cells_of(&self, id: &I) -> Vec<Cell> {
        let mut out: Vec<Cell> = self
            .cells
            .iter()
            .filter(|(_, items)| items.contains(id))
            .map(|(cell, _)| *cell)
            .collect();
        out.sort();
        out
    }
}

impl<I: Clone + Eq + Hash + Ord> CellIndex<I> {
    /// Every item in any cell of `cr`, deduplicated and ordered by id.
    pub fn items_in_rect(&self, cr: CellRect) -> BTreeSet<&I> {
        let mut out = BTreeSet::new();
        for cell in cr.cells() {
            if let Some(items) = self.cells.get(&cell) {
                out.extend(items.iter());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cr(left: i32, top: i32, width: i32, height: i32) -> CellRect {
        CellRect { left, top, width, height }
    }

    #[test]
    fn test_insert_remove_drops_empty_cells() {
        let mut idx = CellIndex::new();
        assert!(idx.insert(&"a", Cell::new(1, 1)));
        assert!(!idx.insert(&"a", Cell::new(1, 1)));
        assert!(idx.insert(&"b", Cell::new(1, 1)));
        assert_eq!(idx.len(), 1);
        assert!(idx.remove(&"a", Cell::new(1, 1)));
        assert_eq!(idx.len(), 1);
        assert!(idx.remove(&"b", Cell::new(1, 1)));
        assert!(idx.is_empty());
        assert!(!idx.remove(&"b", Cell::new(1, 1)));
    }

    #[test]
    fn test_rect_membership() {
        let mut idx = CellIndex::new();
        idx.insert_rect(&1u64, cr(0, 0, 2, 3));
        assert_eq!(idx.len(), 6);
        assert_eq!(idx.memberships(), 6);
        idx.insert_rect(&2u64, cr(1, 1, 2, 2));
        assert_eq!(idx.len(), 8);
        assert_eq!(idx.items_in(Cell::new(1, 1)).map(HashSet::len), Some(2));
        idx.remove_rect(&1u64, cr(0, 0, 2, 3));
        assert_eq!(idx.len(), 4);
        assert!(idx.cells_of(&1u64).is_empty());
    }

    #[test]
    fn test_move_rect_matches_rebuild() {
        let old = cr(0, 0, 3, 2);
        let new = cr(2, 1, 2, 3);
        let mut moved = CellIndex::new();
        moved.insert_rect(&"x", old);
        moved.insert(&"y", Cell::new(0, 0));
        moved.move_rect(&"x", old, new);

        let mut rebuilt = CellIndex::new();
        rebuilt.insert_rect(&"x", new);
        assert_eq!(moved.cells_of(&"x"), rebuilt.cells_of(&"x"));
        assert_eq!(moved.cells_of(&"y"), vec![Cell::new(0, 0)]);
        assert_eq!(moved.len(), 7);
    }

    #[test]
    fn test_items_in_rect_dedupes_and_orders() {
        let mut idx = CellIndex::new();
        idx.insert_rect(&"c", cr(1, 1, 2, 2));
        idx.insert_rect(&"a", cr(2, 2, 1, 1));
        idx.insert(&"b", Cell::new(5, 5));
        let found: Vec<&&str> = idx.items_in_rect(cr(1, 1, 2, 2)).into_iter().collect();
        assert_eq!(found, vec![&"a", &"c"]);
    }
}
