//! Recognition scenarios - catalog, stock and both snapshots for one cycle
//!
//! A scenario is a JSON document:
//!
//! ```json
//! {
//!   "goods": [{"id": "000001", "unit_weight": 100}],
//!   "stock": [{"shelf": 1, "good_id": "000001", "count": 10}],
//!   "begin": [{"shelf": 1, "weight": 1000}],
//!   "end":   [{"shelf": 1, "weight": 900}]
//! }
//! ```
//!
//! Validation here is the boundary check that keeps malformed input away from
//! the recognizer, which itself never rejects data.

use crate::domain::types::{Good, GoodId, ShelfId, ShelfReading, StockEntry};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub goods: Vec<Good>,
    pub stock: Vec<StockEntry>,
    pub begin: Vec<ShelfReading>,
    pub end: Vec<ShelfReading>,
}

impl Scenario {
    /// Load and validate a scenario file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;

        let scenario: Scenario = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scenario file {}", path.display()))?;

        scenario
            .validate()
            .with_context(|| format!("Invalid scenario file {}", path.display()))?;

        info!(
            file = %path.display(),
            goods = %scenario.goods.len(),
            stock = %scenario.stock.len(),
            shelves = %scenario.begin.len(),
            "scenario_loaded"
        );

        Ok(scenario)
    }

    /// Reject catalogs and snapshots the recognizer would silently mis-handle
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut ids: HashSet<&GoodId> = HashSet::new();
        for good in &self.goods {
            if !ids.insert(&good.id) {
                anyhow::bail!("duplicate good id {}", good.id);
            }
            if good.unit_weight == 0 {
                anyhow::bail!("good {} has zero unit weight", good.id);
            }
        }

        let begin: BTreeSet<ShelfId> = self.begin.iter().map(|r| r.shelf).collect();
        let end: BTreeSet<ShelfId> = self.end.iter().map(|r| r.shelf).collect();
        if begin.len() != self.begin.len() || end.len() != self.end.len() {
            anyhow::bail!("a snapshot lists the same shelf more than once");
        }
        if begin != end {
            let missing: Vec<String> =
                begin.symmetric_difference(&end).map(|s| s.to_string()).collect();
            anyhow::bail!("begin and end snapshots disagree on shelves [{}]", missing.join(", "));
        }

        Ok(())
    }

    /// Two shelves: one holding two goods of equal weight, one holding a
    /// single 550g good. Shelf 1 drops 500g and shelf 2 drops 550g.
    pub fn demo() -> Self {
        Self {
            goods: vec![Good::new("1", 500), Good::new("2", 500), Good::new("3", 550)],
            stock: vec![
                StockEntry::new(1, "1", 5),
                StockEntry::new(1, "2", 5),
                StockEntry::new(2, "3", 5),
            ],
            begin: vec![ShelfReading::new(1, 5000), ShelfReading::new(2, 5500)],
            end: vec![ShelfReading::new(1, 4500), ShelfReading::new(2, 4950)],
        }
    }
}
