//! Domain models - catalog, readings and recognition results
//!
//! This module contains the canonical data types used throughout the system:
//! - `Good` / `StockEntry` - catalog and per-shelf stock
//! - `ShelfReading` - one weight sensor sample
//! - `RecognitionResult` - recognized items plus per-shelf anomalies
//! - `ShelfIndex` - per-shelf lookup built from catalog and stock

pub mod shelf_index;
pub mod types;

// Re-export commonly used types at module level
pub use shelf_index::{ShelfIndex, ShelfLayout};
pub use types::{
    AnomalyKind, AnomalyRecord, Good, GoodId, RecognitionResult, RecognizedItem, ShelfId,
    ShelfReading, StockEntry,
};
