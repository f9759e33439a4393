//! Per-cycle aggregation of recognized items across shelves

use crate::domain::types::{GoodId, RecognizedItem};
use rustc_hash::FxHashMap;

/// Running per-good totals for one recognition cycle
///
/// Items come out in the order each good was first seen.
#[derive(Debug, Default)]
pub struct ItemTally {
    order: Vec<GoodId>,
    counts: FxHashMap<GoodId, u32>,
}

impl ItemTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add items from one shelf, summing counts per good
    pub fn merge<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = RecognizedItem>,
    {
        for item in items {
            match self.counts.get_mut(&item.good_id) {
                Some(count) => *count += item.count,
                None => {
                    self.order.push(item.good_id.clone());
                    self.counts.insert(item.good_id, item.count);
                }
            }
        }
    }

    /// Total units across all goods
    pub fn total_units(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    /// Final item list; goods that ended at zero are dropped
    pub fn into_items(mut self) -> Vec<RecognizedItem> {
        self.order
            .into_iter()
            .filter_map(|good_id| {
                let count = self.counts.remove(&good_id)?;
                (count > 0).then(|| RecognizedItem::new(good_id, count))
            })
            .collect()
    }
}
