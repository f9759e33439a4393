//! Services - recognition logic
//!
//! This module contains the recognition pipeline:
//! - `recognizer` - Per-cycle entry point, shelf pairing and anomaly classification
//! - `disambiguation` - Single-good count inference and multi-good subset search
//! - `aggregation` - Summing recognized items across shelves

pub mod aggregation;
pub mod disambiguation;
pub mod recognizer;

// Re-export commonly used types
pub use disambiguation::Tolerances;
pub use recognizer::Recognizer;
