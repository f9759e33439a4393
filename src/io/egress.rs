//! Result egress - appends recognition results to a JSONL file
//!
//! Each cycle becomes one JSON object per line, tagged with a time-sortable
//! UUIDv7 cycle id and the machine id from config.

use crate::domain::types::{AnomalyRecord, RecognitionResult, RecognizedItem};
use anyhow::Context;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_cycle_id() -> String {
    Uuid::now_v7().to_string()
}

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// One line of the egress file
#[derive(Debug, Serialize)]
pub struct CycleRecord<'a> {
    pub cycle_id: String,
    pub machine: &'a str,
    pub ts: u64,
    pub successful: bool,
    pub items: &'a [RecognizedItem],
    pub anomalies: &'a [AnomalyRecord],
}

impl<'a> CycleRecord<'a> {
    pub fn new(machine: &'a str, result: &'a RecognitionResult) -> Self {
        Self {
            cycle_id: new_cycle_id(),
            machine,
            ts: epoch_ms(),
            successful: result.successful,
            items: &result.items,
            anomalies: &result.anomalies,
        }
    }
}

/// Egress writer for recognition results
pub struct Egress {
    file_path: String,
    machine_id: String,
}

impl Egress {
    pub fn new(file_path: &str, machine_id: &str) -> Self {
        info!(file_path = %file_path, machine = %machine_id, "egress_initialized");
        Self { file_path: file_path.to_string(), machine_id: machine_id.to_string() }
    }

    /// Write one cycle's result; returns the cycle id on success
    pub fn write_result(&self, result: &RecognitionResult) -> anyhow::Result<String> {
        let record = CycleRecord::new(&self.machine_id, result);
        let json = serde_json::to_string(&record).context("Failed to serialize cycle record")?;

        self.append_line(&json)
            .with_context(|| format!("Failed to append to {}", self.file_path))?;

        info!(
            cycle_id = %record.cycle_id,
            items = %result.items.len(),
            anomalies = %result.anomalies.len(),
            "result_egressed"
        );
        Ok(record.cycle_id)
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;
        debug!(file = %self.file_path, bytes = %line.len(), "egress_written");

        Ok(())
    }
}
