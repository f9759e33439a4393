//! Shared types for weight recognition

use serde::{Deserialize, Serialize};

/// Lowest weight a shelf sensor can legitimately report (grams)
pub const MIN_SENSOR_WEIGHT: i32 = 0;

/// Highest weight a shelf sensor can legitimately report (16-bit signed range, grams)
pub const MAX_SENSOR_WEIGHT: i32 = 32767;

/// Newtype wrapper for shelf indices to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ShelfId(pub i32);

impl std::fmt::Display for ShelfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype wrapper for catalog good IDs
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoodId(pub String);

impl GoodId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GoodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoodId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Catalog entry: a good and its nominal unit weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Good {
    pub id: GoodId,
    /// Nominal weight of one unit, grams
    pub unit_weight: u32,
}

impl Good {
    pub fn new(id: &str, unit_weight: u32) -> Self {
        Self { id: GoodId::from(id), unit_weight }
    }
}

/// How many units of a good sit on a shelf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockEntry {
    pub shelf: ShelfId,
    pub good_id: GoodId,
    pub count: u32,
}

impl StockEntry {
    pub fn new(shelf: i32, good_id: &str, count: u32) -> Self {
        Self { shelf: ShelfId(shelf), good_id: GoodId::from(good_id), count }
    }
}

/// One weight sensor sample for a shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfReading {
    pub shelf: ShelfId,
    /// Raw sensor value, grams. Signed so faulty telemetry stays representable.
    pub weight: i32,
}

impl ShelfReading {
    #[inline]
    pub fn new(shelf: i32, weight: i32) -> Self {
        Self { shelf: ShelfId(shelf), weight }
    }

    /// Whether the reading falls inside the sensor's valid range
    #[inline]
    pub fn in_sensor_range(&self) -> bool {
        (MIN_SENSOR_WEIGHT..=MAX_SENSOR_WEIGHT).contains(&self.weight)
    }
}

/// A good (and how many units of it) recognized as taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedItem {
    pub good_id: GoodId,
    pub count: u32,
}

impl RecognizedItem {
    pub fn new(good_id: GoodId, count: u32) -> Self {
        Self { good_id, count }
    }
}

/// Classification of a shelf that could not produce a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A reading outside the sensor range (or missing from one snapshot)
    SensorFault,
    /// Weight went up: something was placed on the shelf
    ForeignObject,
    /// Weight went down but no stocked combination explains it
    Unresolved,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::SensorFault => "sensor_fault",
            AnomalyKind::ForeignObject => "foreign_object",
            AnomalyKind::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-shelf anomaly, with the raw readings echoed back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub shelf: ShelfId,
    pub kind: AnomalyKind,
    pub begin_weight: i32,
    pub end_weight: i32,
}

/// Outcome of one recognition cycle
///
/// `successful` reports that the cycle ran to completion. It stays `true` when
/// shelves raised anomalies; inspect `anomalies` to detect partial failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub successful: bool,
    pub items: Vec<RecognizedItem>,
    pub anomalies: Vec<AnomalyRecord>,
}

impl RecognitionResult {
    pub fn new() -> Self {
        Self { successful: true, items: Vec::new(), anomalies: Vec::new() }
    }

    /// Count recognized for a good, 0 if absent
    pub fn count_of(&self, good_id: &str) -> u32 {
        self.items.iter().find(|item| item.good_id.as_str() == good_id).map_or(0, |item| item.count)
    }

    /// Anomalies of a given kind
    pub fn anomalies_of(&self, kind: AnomalyKind) -> impl Iterator<Item = &AnomalyRecord> {
        self.anomalies.iter().filter(move |a| a.kind == kind)
    }

    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

impl Default for RecognitionResult {
    fn default() -> Self {
        Self::new()
    }
}
