//! Weight recognition - infer purchases from vending machine shelf weights
//!
//! Runs one recognition cycle over a scenario file (or the built-in demo
//! scenario) and reports the recognized items and per-shelf anomalies.
//!
//! Module structure:
//! - `domain/` - Core types (Good, StockEntry, ShelfReading, RecognitionResult)
//! - `services/` - Recognition (Recognizer, disambiguation, aggregation)
//! - `infra/` - Infrastructure (Config, Metrics)
//! - `io/` - Scenario loading and result egress

use clap::Parser;
use weight_recognition::infra::{Config, Metrics};
use weight_recognition::io::{Egress, Scenario};
use weight_recognition::services::Recognizer;

/// Weight recognition - infer purchases from shelf weight snapshots
#[derive(Parser, Debug)]
#[command(name = "weight-recognition", version, about)]
struct Args {
    /// Path to TOML configuration file.
    /// Falls back to $CONFIG_FILE, then config/dev.toml
    #[arg(short, long)]
    config: Option<String>,

    /// Scenario JSON file (catalog, stock, begin/end readings).
    /// Runs the built-in demo scenario when omitted.
    #[arg(short, long)]
    scenario: Option<String>,

    /// Override sensor tolerance from config (grams)
    #[arg(long)]
    sensor_tolerance: Option<u32>,

    /// Override package tolerance from config (percent)
    #[arg(long)]
    package_tolerance: Option<f64>,
}
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Default: INFO, use RUST_LOG=debug for per-shelf decisions
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = %env!("GIT_HASH"), "weight-recognition starting");

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref());
    if let Some(grams) = args.sensor_tolerance {
        config = config.with_sensor_tolerance(grams);
    }
    if let Some(percent) = args.package_tolerance {
        if !percent.is_finite() || percent < 0.0 {
            anyhow::bail!("--package-tolerance must be a finite value >= 0, got {}", percent);
        }
        config = config.with_package_tolerance(percent);
    }

    info!(
        config_file = %config.config_file(),
        machine = %config.machine_id(),
        sensor_tolerance = %config.sensor_tolerance(),
        package_tolerance = %config.package_tolerance(),
        egress_enabled = %config.egress_enabled(),
        "config_loaded"
    );

    let scenario = match &args.scenario {
        Some(path) => Scenario::from_file(path)?,
        None => {
            info!("scenario_demo");
            Scenario::demo()
        }
    };

    let recognizer = Recognizer::new(config.tolerances(), &scenario.goods, &scenario.stock);
    let metrics = Metrics::new();
    let result = recognizer.recognize_with_metrics(&scenario.begin, &scenario.end, &metrics);

    for item in &result.items {
        info!(good_id = %item.good_id, count = %item.count, "item_recognized");
    }
    for anomaly in &result.anomalies {
        warn!(
            shelf = %anomaly.shelf,
            kind = %anomaly.kind,
            begin_weight = %anomaly.begin_weight,
            end_weight = %anomaly.end_weight,
            "anomaly_reported"
        );
    }

    if config.egress_enabled() {
        let egress = Egress::new(config.egress_file(), config.machine_id());
        egress.write_result(&result)?;
    }

    metrics.report().log();

    info!(successful = %result.successful, "weight-recognition complete");
    Ok(())
}
