//! Per-shelf view of the catalog
//!
//! Built once from the goods catalog and the stock list. Each shelf knows which
//! distinct goods it carries (in stocking order) and how many units of each.

use crate::domain::types::{Good, GoodId, ShelfId, StockEntry};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Goods and stock counts for one shelf
#[derive(Debug, Clone, Default)]
pub struct ShelfLayout {
    goods: Vec<Good>,
    stock: FxHashMap<GoodId, u32>,
}

impl ShelfLayout {
    /// Distinct goods on the shelf, in the order they were first stocked
    pub fn goods(&self) -> &[Good] {
        &self.goods
    }

    /// Units of a good on this shelf (0 if not stocked here)
    pub fn stock_of(&self, good_id: &GoodId) -> u32 {
        self.stock.get(good_id).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.goods.is_empty()
    }
}

/// Immutable shelf → layout lookup
#[derive(Debug, Clone, Default)]
pub struct ShelfIndex {
    shelves: FxHashMap<ShelfId, ShelfLayout>,
}

impl ShelfIndex {
    /// Build the index from a catalog and stock list.
    ///
    /// A stock entry naming a good missing from the catalog still records its
    /// count, but the good is left out of the shelf's good set. Repeating a
    /// (shelf, good) pair overwrites the earlier count.
    pub fn build(catalog: &[Good], stock: &[StockEntry]) -> Self {
        let by_id: FxHashMap<&GoodId, &Good> = catalog.iter().map(|g| (&g.id, g)).collect();
        let mut shelves: FxHashMap<ShelfId, ShelfLayout> = FxHashMap::default();

        for entry in stock {
            let layout = shelves.entry(entry.shelf).or_default();
            let seen = layout.stock.insert(entry.good_id.clone(), entry.count).is_some();

            match by_id.get(&entry.good_id) {
                Some(good) if !seen => layout.goods.push((*good).clone()),
                Some(_) => {}
                None => {
                    debug!(
                        shelf = %entry.shelf,
                        good_id = %entry.good_id,
                        "stock_unknown_good"
                    );
                }
            }
        }

        Self { shelves }
    }

    pub fn shelf(&self, shelf: ShelfId) -> Option<&ShelfLayout> {
        self.shelves.get(&shelf)
    }

    /// Shelf indices known to the index, ascending
    pub fn shelf_ids(&self) -> Vec<ShelfId> {
        let mut ids: Vec<ShelfId> = self.shelves.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.shelves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shelves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Good> {
        vec![Good::new("000001", 100), Good::new("000002", 200)]
    }

    #[test]
    fn test_build_groups_goods_by_shelf() {
        let stock = vec![
            StockEntry::new(1, "000001", 10),
            StockEntry::new(1, "000002", 5),
            StockEntry::new(2, "000002", 3),
        ];
        let index = ShelfIndex::build(&catalog(), &stock);

        assert_eq!(index.len(), 2);
        let shelf1 = index.shelf(ShelfId(1)).unwrap();
        assert_eq!(shelf1.goods().len(), 2);
        assert_eq!(shelf1.stock_of(&GoodId::from("000001")), 10);
        assert_eq!(shelf1.stock_of(&GoodId::from("000002")), 5);

        let shelf2 = index.shelf(ShelfId(2)).unwrap();
        assert_eq!(shelf2.goods(), &[Good::new("000002", 200)]);
        assert_eq!(shelf2.stock_of(&GoodId::from("000001")), 0);
    }

    #[test]
    fn test_unknown_good_keeps_count_but_not_good() {
        let stock = vec![StockEntry::new(3, "999999", 4)];
        let index = ShelfIndex::build(&catalog(), &stock);

        let shelf = index.shelf(ShelfId(3)).unwrap();
        assert!(shelf.is_empty());
        assert_eq!(shelf.stock_of(&GoodId::from("999999")), 4);
    }

    #[test]
    fn test_repeated_entry_overwrites_count_without_duplicating_good() {
        let stock = vec![StockEntry::new(1, "000001", 10), StockEntry::new(1, "000001", 2)];
        let index = ShelfIndex::build(&catalog(), &stock);

        let shelf = index.shelf(ShelfId(1)).unwrap();
        assert_eq!(shelf.goods().len(), 1);
        assert_eq!(shelf.stock_of(&GoodId::from("000001")), 2);
    }

    #[test]
    fn test_shelf_ids_sorted() {
        let stock = vec![
            StockEntry::new(3, "000001", 1),
            StockEntry::new(1, "000001", 1),
            StockEntry::new(2, "000002", 1),
        ];
        let index = ShelfIndex::build(&catalog(), &stock);
        assert_eq!(index.shelf_ids(), vec![ShelfId(1), ShelfId(2), ShelfId(3)]);
        assert!(index.shelf(ShelfId(9)).is_none());
    }
}
