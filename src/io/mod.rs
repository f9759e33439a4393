//! IO modules - data in and results out
//!
//! - `scenario` - JSON scenario files (catalog, stock, both snapshots)
//! - `egress` - Recognition results to file (JSONL format)

pub mod egress;
pub mod scenario;

// Re-export commonly used types
pub use egress::Egress;
pub use scenario::Scenario;
