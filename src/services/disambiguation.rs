//! Per-shelf disambiguation of a weight loss into goods
//!
//! Given how much weight left a shelf, work out which stocked goods were taken:
//! - one good on the shelf: infer a unit count from the packaging band
//! - several goods: exhaustive subset search, one unit per included good
//!
//! An empty answer means the delta is unresolved for this shelf.

use crate::domain::shelf_index::ShelfLayout;
use crate::domain::types::{Good, RecognizedItem, ShelfId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Upper bound on distinct goods per shelf for the subset search (2^n subsets)
pub const MAX_SUBSET_GOODS: usize = 16;

/// Items recognized on a single shelf
pub type ShelfItems = SmallVec<[RecognizedItem; 4]>;

/// Noise margins applied during recognition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Absolute sensor noise margin, grams
    pub sensor_grams: u32,
    /// Packaging variance around a good's nominal weight, percent
    pub package_percent: f64,
}

impl Tolerances {
    pub fn new(sensor_grams: u32, package_percent: f64) -> Self {
        Self { sensor_grams, package_percent }
    }

    #[inline]
    pub fn sensor(&self) -> i64 {
        i64::from(self.sensor_grams)
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { sensor_grams: 10, package_percent: 5.0 }
    }
}

/// Weight range one unit of a good may weigh once packaging variance is allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightBand {
    pub min: i64,
    pub max: i64,
}

impl WeightBand {
    /// Both bounds are computed in floating point and truncated toward zero.
    pub fn for_unit(unit_weight: u32, package_percent: f64) -> Self {
        let unit = f64::from(unit_weight);
        let ratio = package_percent / 100.0;
        Self { min: (unit * (1.0 - ratio)) as i64, max: (unit * (1.0 + ratio)) as i64 }
    }

    /// Integer midpoint of the band
    #[inline]
    pub fn midpoint(&self) -> i64 {
        (self.min + self.max) / 2
    }
}

/// A good considered by the subset search, with its shelf stock and band
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub good: &'a Good,
    pub stock: u32,
    pub band: WeightBand,
}

/// Evaluation of one subset of candidates (bit `j` of `mask` selects candidate `j`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetEval {
    pub mask: u32,
    pub members: u32,
    pub total: i64,
    pub deviation: i64,
}

/// Infer how many units of a single good explain `delta`.
///
/// Reports the smallest feasible count; `None` if no positive count within
/// stock fits the band.
pub fn infer_single(
    good: &Good,
    stock: u32,
    delta: i64,
    tolerances: &Tolerances,
) -> Option<RecognizedItem> {
    let band = WeightBand::for_unit(good.unit_weight, tolerances.package_percent);
    if band.min <= 0 || band.max <= 0 {
        return None;
    }

    let sensor = tolerances.sensor();
    let min_count = ((delta - sensor) as f64 / band.max as f64).ceil() as i64;
    let max_count = ((delta + sensor) as f64 / band.min as f64).floor() as i64;

    let min_count = min_count.max(0);
    let max_count = max_count.min(i64::from(stock));

    if min_count > 0 && min_count <= max_count {
        Some(RecognizedItem::new(good.id.clone(), min_count as u32))
    } else {
        None
    }
}

/// Evaluate a subset assuming one unit of each selected good.
///
/// Returns `None` when a selected good has no stock left on the shelf.
pub fn evaluate_subset(candidates: &[Candidate<'_>], mask: u32, delta: i64) -> Option<SubsetEval> {
    let mut total = 0i64;
    let mut members = 0u32;

    for (j, candidate) in candidates.iter().enumerate() {
        if mask & (1 << j) == 0 {
            continue;
        }
        if candidate.stock == 0 {
            return None;
        }
        total += candidate.band.midpoint();
        members += 1;
    }

    Some(SubsetEval { mask, members, total, deviation: (total - delta).abs() })
}

/// Search every non-empty subset for the best explanation of `delta`.
///
/// Within sensor tolerance, more goods wins and smaller deviation breaks ties.
/// Until some subset lands within tolerance, the closest one is kept as a
/// fallback. The winner is rejected if its deviation exceeds twice the sensor
/// tolerance.
pub fn best_subset(candidates: &[Candidate<'_>], delta: i64, sensor: i64) -> Option<SubsetEval> {
    let n = candidates.len();
    if n == 0 || n > MAX_SUBSET_GOODS {
        return None;
    }

    let mut best: Option<SubsetEval> = None;
    let mut best_within = false;

    for mask in 1..(1u32 << n) {
        let Some(eval) = evaluate_subset(candidates, mask, delta) else {
            continue;
        };
        let within = eval.deviation <= sensor;
        debug!(
            mask = %eval.mask,
            members = %eval.members,
            total = %eval.total,
            deviation = %eval.deviation,
            within = %within,
            "subset_evaluated"
        );

        let better = match best {
            None => true,
            Some(current) if within => {
                !best_within
                    || eval.members > current.members
                    || (eval.members == current.members && eval.deviation < current.deviation)
            }
            Some(current) => !best_within && eval.deviation < current.deviation,
        };

        if better {
            best = Some(eval);
            best_within = within;
        }
    }

    best.filter(|eval| eval.deviation <= sensor * 2)
}

/// Resolve a shelf's weight loss into recognized items.
///
/// An empty result means the shelf is unresolved.
pub fn disambiguate(
    shelf: ShelfId,
    layout: &ShelfLayout,
    delta: i64,
    tolerances: &Tolerances,
) -> ShelfItems {
    let mut items = ShelfItems::new();

    match layout.goods() {
        [] => {
            debug!(shelf = %shelf, delta = %delta, "shelf_no_goods");
        }
        [good] => {
            let stock = layout.stock_of(&good.id);
            match infer_single(good, stock, delta, tolerances) {
                Some(item) => {
                    debug!(
                        shelf = %shelf,
                        good_id = %item.good_id,
                        count = %item.count,
                        stock = %stock,
                        "shelf_single_good"
                    );
                    items.push(item);
                }
                None => {
                    debug!(shelf = %shelf, delta = %delta, stock = %stock, "shelf_single_no_fit");
                }
            }
        }
        goods => {
            let mut sorted: Vec<&Good> = goods.iter().collect();
            sorted.sort_by_key(|g| g.unit_weight);

            if sorted.windows(2).any(|pair| pair[0].unit_weight == pair[1].unit_weight) {
                debug!(shelf = %shelf, goods = %sorted.len(), "shelf_duplicate_weights");
                return items;
            }

            if sorted.len() > MAX_SUBSET_GOODS {
                warn!(
                    shelf = %shelf,
                    goods = %sorted.len(),
                    max = %MAX_SUBSET_GOODS,
                    "shelf_too_many_goods"
                );
                return items;
            }

            let candidates: Vec<Candidate<'_>> = sorted
                .into_iter()
                .map(|good| Candidate {
                    good,
                    stock: layout.stock_of(&good.id),
                    band: WeightBand::for_unit(good.unit_weight, tolerances.package_percent),
                })
                .collect();

            match best_subset(&candidates, delta, tolerances.sensor()) {
                Some(eval) => {
                    debug!(
                        shelf = %shelf,
                        mask = %eval.mask,
                        members = %eval.members,
                        total = %eval.total,
                        deviation = %eval.deviation,
                        "subset_selected"
                    );
                    for (j, candidate) in candidates.iter().enumerate() {
                        if eval.mask & (1 << j) != 0 {
                            items.push(RecognizedItem::new(candidate.good.id.clone(), 1));
                        }
                    }
                }
                None => {
                    debug!(shelf = %shelf, delta = %delta, "subset_no_fit");
                }
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shelf_index::ShelfIndex;
    use crate::domain::types::StockEntry;

    fn tol() -> Tolerances {
        Tolerances::new(10, 5.0)
    }

    fn candidates<'a>(goods: &'a [Good], stock: &[u32]) -> Vec<Candidate<'a>> {
        goods
            .iter()
            .zip(stock)
            .map(|(good, &stock)| Candidate {
                good,
                stock,
                band: WeightBand::for_unit(good.unit_weight, 5.0),
            })
            .collect()
    }

    #[test]
    fn test_weight_band_truncates() {
        let band = WeightBand::for_unit(100, 5.0);
        assert_eq!(band, WeightBand { min: 95, max: 105 });
        assert_eq!(band.midpoint(), 100);

        // 550 * 0.95 = 522.5, 550 * 1.05 = 577.5
        let band = WeightBand::for_unit(550, 5.0);
        assert_eq!(band, WeightBand { min: 522, max: 577 });
        assert_eq!(band.midpoint(), 549);
    }

    #[test]
    fn test_infer_single_one_unit() {
        let good = Good::new("000001", 100);
        let item = infer_single(&good, 10, 100, &tol()).unwrap();
        assert_eq!(item.count, 1);
    }

    #[test]
    fn test_infer_single_three_units() {
        let good = Good::new("000001", 100);
        let item = infer_single(&good, 10, 300, &tol()).unwrap();
        assert_eq!(item.count, 3);
    }

    #[test]
    fn test_infer_single_capped_by_stock() {
        let good = Good::new("000001", 100);
        // 3 units taken but only 2 recorded on the shelf
        assert!(infer_single(&good, 2, 300, &tol()).is_none());
        assert_eq!(infer_single(&good, 3, 300, &tol()).unwrap().count, 3);
    }

    #[test]
    fn test_infer_single_no_fit_between_counts() {
        let good = Good::new("000001", 100);
        // 150g sits between one and two units
        assert!(infer_single(&good, 10, 150, &tol()).is_none());
    }

    #[test]
    fn test_infer_single_reports_smallest_feasible_count() {
        let good = Good::new("000001", 100);
        // Wide packaging band makes both 4 and 5 units feasible for 450g
        let loose = Tolerances::new(10, 20.0);
        assert_eq!(infer_single(&good, 10, 450, &loose).unwrap().count, 4);
    }

    #[test]
    fn test_infer_single_degenerate_band() {
        let good = Good::new("000001", 100);
        let extreme = Tolerances::new(10, 100.0);
        assert!(infer_single(&good, 10, 100, &extreme).is_none());
    }

    #[test]
    fn test_evaluate_subset_sums_midpoints() {
        let goods = vec![Good::new("a", 100), Good::new("b", 500)];
        let c = candidates(&goods, &[10, 5]);

        let eval = evaluate_subset(&c, 0b11, 600).unwrap();
        assert_eq!(eval.members, 2);
        assert_eq!(eval.total, 600);
        assert_eq!(eval.deviation, 0);

        let eval = evaluate_subset(&c, 0b01, 600).unwrap();
        assert_eq!(eval.total, 100);
        assert_eq!(eval.deviation, 500);
    }

    #[test]
    fn test_evaluate_subset_rejects_empty_stock() {
        let goods = vec![Good::new("a", 100), Good::new("b", 500)];
        let c = candidates(&goods, &[10, 0]);
        assert!(evaluate_subset(&c, 0b10, 500).is_none());
        assert!(evaluate_subset(&c, 0b01, 100).is_some());
    }

    #[test]
    fn test_best_subset_prefers_more_goods_within_tolerance() {
        let goods = vec![Good::new("a", 100), Good::new("b", 200), Good::new("c", 300)];
        let c = candidates(&goods, &[5, 5, 5]);
        // 300g: {c} and {a, b} both fit exactly; the larger subset wins
        let eval = best_subset(&c, 300, 10).unwrap();
        assert_eq!(eval.mask, 0b011);
        assert_eq!(eval.members, 2);
    }

    #[test]
    fn test_best_subset_within_tolerance_beats_earlier_fallback() {
        let goods = vec![Good::new("a", 100), Good::new("b", 200), Good::new("c", 330)];
        let c = candidates(&goods, &[5, 5, 5]);
        // {a, b} = 300 is 25 off (fallback), {c} = 329 is 4 off and must win
        let eval = best_subset(&c, 325, 10).unwrap();
        assert_eq!(eval.mask, 0b100);
    }

    #[test]
    fn test_best_subset_accepts_fallback_within_double_tolerance() {
        let goods = vec![Good::new("a", 100), Good::new("b", 500)];
        let c = candidates(&goods, &[5, 5]);
        // 615g is 15 off {a, b}: outside 10 but within 20
        let eval = best_subset(&c, 615, 10).unwrap();
        assert_eq!(eval.mask, 0b11);
        assert_eq!(eval.deviation, 15);
    }

    #[test]
    fn test_best_subset_rejects_beyond_double_tolerance() {
        let goods = vec![Good::new("a", 100), Good::new("b", 500)];
        let c = candidates(&goods, &[5, 5]);
        assert!(best_subset(&c, 350, 10).is_none());
    }

    #[test]
    fn test_best_subset_double_tolerance_is_inclusive() {
        let goods = vec![Good::new("a", 100), Good::new("b", 500)];
        let c = candidates(&goods, &[5, 5]);

        let eval = best_subset(&c, 620, 10).unwrap();
        assert_eq!(eval.mask, 0b11);
        assert_eq!(eval.deviation, 20);

        assert!(best_subset(&c, 621, 10).is_none());
    }

    #[test]
    fn test_best_subset_tie_keeps_first_mask() {
        // Bands 95..105 and 114..126: midpoints 100 and 120, both 10 off 110g
        let goods = vec![Good::new("a", 100), Good::new("b", 120)];
        let c = candidates(&goods, &[5, 5]);
        let eval = best_subset(&c, 110, 10).unwrap();
        assert_eq!(eval.mask, 0b01);
        assert_eq!(eval.deviation, 10);
    }

    #[test]
    fn test_best_subset_refuses_too_many_candidates() {
        let goods: Vec<Good> =
            (1..=17u32).map(|i| Good::new(&format!("g{i:02}"), i * 100)).collect();
        let c = candidates(&goods, &[5; 17]);
        assert!(best_subset(&c, 100, 10).is_none());
        assert!(best_subset(&c[..16], 100, 10).is_some());
    }

    #[test]
    fn test_disambiguate_too_many_goods_unresolved() {
        let catalog: Vec<Good> =
            (1..=17u32).map(|i| Good::new(&format!("g{i:02}"), i * 100)).collect();
        let stock: Vec<StockEntry> =
            catalog.iter().map(|g| StockEntry::new(1, g.id.as_str(), 5)).collect();
        let index = ShelfIndex::build(&catalog, &stock);
        let layout = index.shelf(ShelfId(1)).unwrap();
        assert_eq!(layout.goods().len(), MAX_SUBSET_GOODS + 1);

        assert!(disambiguate(ShelfId(1), layout, 100, &tol()).is_empty());
    }

    #[test]
    fn test_disambiguate_duplicate_weights_unresolved() {
        let catalog = vec![Good::new("000001", 100), Good::new("000002", 100)];
        let stock = vec![StockEntry::new(1, "000001", 10), StockEntry::new(1, "000002", 10)];
        let index = ShelfIndex::build(&catalog, &stock);
        let layout = index.shelf(ShelfId(1)).unwrap();

        assert!(disambiguate(ShelfId(1), layout, 100, &tol()).is_empty());
        assert!(disambiguate(ShelfId(1), layout, 200, &Tolerances::new(50, 0.0)).is_empty());
    }

    #[test]
    fn test_disambiguate_multi_good_one_each() {
        let catalog = vec![Good::new("000002", 500), Good::new("000001", 100)];
        let stock = vec![StockEntry::new(1, "000002", 5), StockEntry::new(1, "000001", 10)];
        let index = ShelfIndex::build(&catalog, &stock);
        let layout = index.shelf(ShelfId(1)).unwrap();

        let items = disambiguate(ShelfId(1), layout, 600, &tol());
        assert_eq!(items.len(), 2);
        // Emitted in ascending unit weight
        assert_eq!(items[0], RecognizedItem::new("000001".into(), 1));
        assert_eq!(items[1], RecognizedItem::new("000002".into(), 1));
    }

    #[test]
    fn test_disambiguate_empty_shelf() {
        let layout = ShelfLayout::default();
        assert!(disambiguate(ShelfId(4), &layout, 100, &tol()).is_empty());
    }
}
