//! Vending machine weight recognition library
//!
//! Infers which goods left a vending machine's shelves from two weight
//! snapshots. Exposes modules for integration testing and binary reuse.

pub mod domain;
pub mod infra;
pub mod io;
pub mod services;
