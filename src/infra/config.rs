//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::services::disambiguation::Tolerances;
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";
pub const DEFAULT_CONFIG_PATH: &str = "config/dev.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct MachineConfig {
    /// Machine identifier written into every egress record
    #[serde(default = "default_machine_id")]
    pub id: String,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self { id: default_machine_id() }
    }
}

fn default_machine_id() -> String {
    "vending".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToleranceConfig {
    /// Absolute sensor noise margin (grams)
    #[serde(default = "default_sensor_grams")]
    pub sensor_grams: u32,
    /// Packaging variance around nominal unit weight (percent)
    #[serde(default = "default_package_percent")]
    pub package_percent: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { sensor_grams: default_sensor_grams(), package_percent: default_package_percent() }
    }
}

fn default_sensor_grams() -> u32 {
    10
}

fn default_package_percent() -> f64 {
    5.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for recognition results (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
    #[serde(default)]
    pub enabled: bool,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file(), enabled: false }
    }
}

fn default_egress_file() -> String {
    "results.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub egress: EgressConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    machine_id: String,
    sensor_tolerance: u32,
    package_tolerance: f64,
    egress_enabled: bool,
    egress_file: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            machine_id: default_machine_id(),
            sensor_tolerance: default_sensor_grams(),
            package_tolerance: default_package_percent(),
            egress_enabled: false,
            egress_file: default_egress_file(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from the `--config` value or environment
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var(CONFIG_FILE_ENV) {
            if !path.is_empty() {
                return path;
            }
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let tolerance = toml_config.tolerance;
        if !tolerance.package_percent.is_finite() || tolerance.package_percent < 0.0 {
            anyhow::bail!(
                "Invalid package_percent {} in {}: must be a finite value >= 0",
                tolerance.package_percent,
                path.display()
            );
        }

        Ok(Self {
            machine_id: toml_config.machine.id,
            sensor_tolerance: tolerance.sensor_grams,
            package_tolerance: tolerance.package_percent,
            egress_enabled: toml_config.egress.enabled,
            egress_file: toml_config.egress.file,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from the `--config` value / environment
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(&Self::resolve_config_path(cli_path))
    }

    /// Tolerances handed to the recognizer
    pub fn tolerances(&self) -> Tolerances {
        Tolerances::new(self.sensor_tolerance, self.package_tolerance)
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn sensor_tolerance(&self) -> u32 {
        self.sensor_tolerance
    }

    pub fn package_tolerance(&self) -> f64 {
        self.package_tolerance
    }

    pub fn egress_enabled(&self) -> bool {
        self.egress_enabled
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override the sensor tolerance (CLI flag)
    pub fn with_sensor_tolerance(mut self, grams: u32) -> Self {
        self.sensor_tolerance = grams;
        self
    }

    /// Override the package tolerance (CLI flag)
    pub fn with_package_tolerance(mut self, percent: f64) -> Self {
        self.package_tolerance = percent;
        self
    }
}
