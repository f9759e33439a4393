//! Lock-free recognition metrics and periodic reporting
//!
//! Uses atomics so a shared `Metrics` can be updated from any caller without
//! locking. `report()` swaps the periodic counters to get a snapshot.
//!
//! NOTE: All atomics use Relaxed ordering: these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use crate::domain::types::{AnomalyKind, RecognitionResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Exponential bucket boundaries for cycle latency (microseconds)
/// Buckets: ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, ≤5120, >5120
const BUCKET_BOUNDS: [u64; 10] = [10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Upper bounds for each bucket (last bucket uses 2x the previous bound)
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] =
        [10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120, 10240];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free recognition metrics collector
pub struct Metrics {
    /// Recognition cycles run (monotonic)
    cycles_total: AtomicU64,
    /// Cycles since last report (reset on report)
    cycles_since_report: AtomicU64,
    /// Shelves evaluated across all cycles (monotonic)
    shelves_total: AtomicU64,
    /// Units recognized, summed over item counts (monotonic)
    units_total: AtomicU64,
    /// Anomalies by kind (monotonic)
    sensor_faults_total: AtomicU64,
    foreign_objects_total: AtomicU64,
    unresolved_total: AtomicU64,
    /// Sum of cycle latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max cycle latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Cycle latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// When the last report was taken
    last_report_time: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_since_report: AtomicU64::new(0),
            shelves_total: AtomicU64::new(0),
            units_total: AtomicU64::new(0),
            sensor_faults_total: AtomicU64::new(0),
            foreign_objects_total: AtomicU64::new(0),
            unresolved_total: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: Default::default(),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    /// Record one finished recognition cycle
    pub fn record_cycle(&self, shelves: usize, result: &RecognitionResult, latency_us: u64) {
        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        self.cycles_since_report.fetch_add(1, Ordering::Relaxed);
        self.shelves_total.fetch_add(shelves as u64, Ordering::Relaxed);

        let units: u64 = result.items.iter().map(|item| u64::from(item.count)).sum();
        self.units_total.fetch_add(units, Ordering::Relaxed);

        for anomaly in &result.anomalies {
            self.record_anomaly(anomaly.kind);
        }

        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_anomaly(&self, kind: AnomalyKind) {
        let counter = match kind {
            AnomalyKind::SensorFault => &self.sensor_faults_total,
            AnomalyKind::ForeignObject => &self.foreign_objects_total,
            AnomalyKind::Unresolved => &self.unresolved_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles_total(&self) -> u64 {
        self.cycles_total.load(Ordering::Relaxed)
    }

    pub fn anomalies_total(&self, kind: AnomalyKind) -> u64 {
        match kind {
            AnomalyKind::SensorFault => self.sensor_faults_total.load(Ordering::Relaxed),
            AnomalyKind::ForeignObject => self.foreign_objects_total.load(Ordering::Relaxed),
            AnomalyKind::Unresolved => self.unresolved_total.load(Ordering::Relaxed),
        }
    }

    /// Snapshot the counters, resetting the periodic ones
    pub fn report(&self) -> MetricsSummary {
        let cycles_count = self.cycles_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let cycles_per_sec = if elapsed.as_secs_f64() > 0.0 {
            cycles_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let avg_latency = if cycles_count > 0 { latency_sum / cycles_count } else { 0 };

        MetricsSummary {
            cycles_total: self.cycles_total.load(Ordering::Relaxed),
            cycles_per_sec,
            shelves_total: self.shelves_total.load(Ordering::Relaxed),
            units_total: self.units_total.load(Ordering::Relaxed),
            sensor_faults_total: self.sensor_faults_total.load(Ordering::Relaxed),
            foreign_objects_total: self.foreign_objects_total.load(Ordering::Relaxed),
            unresolved_total: self.unresolved_total.load(Ordering::Relaxed),
            avg_latency_us: avg_latency,
            max_latency_us: max_latency,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            lat_buckets,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time metrics snapshot
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub cycles_total: u64,
    pub cycles_per_sec: f64,
    pub shelves_total: u64,
    pub units_total: u64,
    pub sensor_faults_total: u64,
    pub foreign_objects_total: u64,
    pub unresolved_total: u64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    /// Bounds: ≤10, ≤20, ≤40, ≤80, ≤160, ≤320, ≤640, ≤1280, ≤2560, ≤5120, >5120 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn anomalies_total(&self) -> u64 {
        self.sensor_faults_total + self.foreign_objects_total + self.unresolved_total
    }

    pub fn log(&self) {
        info!(
            cycles_total = %self.cycles_total,
            cycles_per_sec = format!("{:.1}", self.cycles_per_sec),
            shelves_total = %self.shelves_total,
            units_total = %self.units_total,
            sensor_faults = %self.sensor_faults_total,
            foreign_objects = %self.foreign_objects_total,
            unresolved = %self.unresolved_total,
            avg_latency_us = %self.avg_latency_us,
            max_latency_us = %self.max_latency_us,
            p50_us = %self.lat_p50_us,
            p99_us = %self.lat_p99_us,
            "metrics"
        );
    }
}
