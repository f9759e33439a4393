//! Weight recognizer - turns two shelf weight snapshots into purchases
//!
//! Built once from the catalog and stock, then invoked once per cycle with the
//! "begin" and "end" readings. Each shelf is classified independently:
//!
//! 1. reading outside the sensor range → `SensorFault`
//! 2. weight increased → `ForeignObject`
//! 3. change within sensor tolerance → no purchase
//! 4. otherwise disambiguate the loss; nothing fits → `Unresolved`
//!
//! An anomaly on one shelf never stops the others from being processed.

use crate::domain::shelf_index::ShelfIndex;
use crate::domain::types::{
    AnomalyKind, AnomalyRecord, Good, RecognitionResult, ShelfId, ShelfReading, StockEntry,
};
use crate::infra::metrics::Metrics;
use crate::services::aggregation::ItemTally;
use crate::services::disambiguation::{disambiguate, ShelfItems, Tolerances};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Weight echoed for the side of a shelf that is missing from a snapshot
pub const MISSING_READING: i32 = -1;

/// Classification of one shelf for one cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ShelfOutcome {
    NoChange,
    Items(ShelfItems),
    Anomaly(AnomalyKind),
}

/// Begin/end weights joined by shelf index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairedReading {
    pub begin: Option<i32>,
    pub end: Option<i32>,
}

/// Join both snapshots by shelf index, ascending.
///
/// A shelf repeated within one snapshot keeps its last reading.
pub fn pair_readings(
    begin: &[ShelfReading],
    end: &[ShelfReading],
) -> BTreeMap<ShelfId, PairedReading> {
    let mut pairs: BTreeMap<ShelfId, PairedReading> = BTreeMap::new();
    for reading in begin {
        pairs.entry(reading.shelf).or_default().begin = Some(reading.weight);
    }
    for reading in end {
        pairs.entry(reading.shelf).or_default().end = Some(reading.weight);
    }
    pairs
}

/// Stateless recognizer over an immutable shelf index
#[derive(Debug, Clone)]
pub struct Recognizer {
    tolerances: Tolerances,
    index: ShelfIndex,
}

impl Recognizer {
    pub fn new(tolerances: Tolerances, catalog: &[Good], stock: &[StockEntry]) -> Self {
        let index = ShelfIndex::build(catalog, stock);
        info!(
            shelves = %index.len(),
            goods = %catalog.len(),
            sensor_tolerance = %tolerances.sensor_grams,
            package_tolerance = %tolerances.package_percent,
            "recognizer_built"
        );
        Self { tolerances, index }
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn index(&self) -> &ShelfIndex {
        &self.index
    }

    /// Run one recognition cycle.
    ///
    /// Always returns `successful = true`; per-shelf failures are reported in
    /// `anomalies`, one per faulted shelf in shelf order.
    pub fn recognize(&self, begin: &[ShelfReading], end: &[ShelfReading]) -> RecognitionResult {
        self.run_cycle(begin, end).0
    }

    /// Run one cycle and record it in `metrics`
    pub fn recognize_with_metrics(
        &self,
        begin: &[ShelfReading],
        end: &[ShelfReading],
        metrics: &Metrics,
    ) -> RecognitionResult {
        let started = Instant::now();
        let (result, shelves) = self.run_cycle(begin, end);
        let latency_us = started.elapsed().as_micros() as u64;

        metrics.record_cycle(shelves, &result, latency_us);
        result
    }

    /// One cycle: the result plus the number of shelves joined
    fn run_cycle(&self, begin: &[ShelfReading], end: &[ShelfReading]) -> (RecognitionResult, usize) {
        let mut result = RecognitionResult::new();
        let mut tally = ItemTally::new();
        let pairs = pair_readings(begin, end);

        for (shelf, pair) in &pairs {
            let (Some(begin_weight), Some(end_weight)) = (pair.begin, pair.end) else {
                let record = AnomalyRecord {
                    shelf: *shelf,
                    kind: AnomalyKind::SensorFault,
                    begin_weight: pair.begin.unwrap_or(MISSING_READING),
                    end_weight: pair.end.unwrap_or(MISSING_READING),
                };
                warn!(
                    shelf = %shelf,
                    has_begin = %pair.begin.is_some(),
                    has_end = %pair.end.is_some(),
                    "shelf_reading_missing"
                );
                result.anomalies.push(record);
                continue;
            };

            let begin_reading = ShelfReading { shelf: *shelf, weight: begin_weight };
            let end_reading = ShelfReading { shelf: *shelf, weight: end_weight };

            match self.evaluate_shelf(begin_reading, end_reading) {
                ShelfOutcome::NoChange => {}
                ShelfOutcome::Items(items) => tally.merge(items),
                ShelfOutcome::Anomaly(kind) => {
                    warn!(
                        shelf = %shelf,
                        kind = %kind.as_str(),
                        begin_weight = %begin_weight,
                        end_weight = %end_weight,
                        "shelf_anomaly"
                    );
                    result.anomalies.push(AnomalyRecord {
                        shelf: *shelf,
                        kind,
                        begin_weight,
                        end_weight,
                    });
                }
            }
        }

        result.items = tally.into_items();

        info!(
            shelves = %pairs.len(),
            items = %result.items.len(),
            anomalies = %result.anomalies.len(),
            "recognition_complete"
        );

        (result, pairs.len())
    }

    /// Classify a single shelf from its begin/end readings
    pub fn evaluate_shelf(&self, begin: ShelfReading, end: ShelfReading) -> ShelfOutcome {
        let shelf = begin.shelf;

        if !begin.in_sensor_range() || !end.in_sensor_range() {
            return ShelfOutcome::Anomaly(AnomalyKind::SensorFault);
        }

        if end.weight > begin.weight {
            return ShelfOutcome::Anomaly(AnomalyKind::ForeignObject);
        }

        let delta = i64::from(begin.weight) - i64::from(end.weight);
        if delta.abs() <= self.tolerances.sensor() {
            debug!(shelf = %shelf, delta = %delta, "shelf_no_change");
            return ShelfOutcome::NoChange;
        }

        let items = match self.index.shelf(shelf) {
            Some(layout) => disambiguate(shelf, layout, delta, &self.tolerances),
            None => {
                debug!(shelf = %shelf, delta = %delta, "shelf_not_stocked");
                ShelfItems::new()
            }
        };

        if items.is_empty() {
            ShelfOutcome::Anomaly(AnomalyKind::Unresolved)
        } else {
            ShelfOutcome::Items(items)
        }
    }
}
