//! Integration tests for configuration loading

use std::io::Write;
use tempfile::NamedTempFile;
use weight_recognition::infra::config::{CONFIG_FILE_ENV, DEFAULT_CONFIG_PATH};
use weight_recognition::infra::Config;
use weight_recognition::services::Tolerances;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[machine]
id = "vm-042"

[tolerance]
sensor_grams = 15
package_percent = 2.5

[egress]
file = "out/results.jsonl"
enabled = true
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.machine_id(), "vm-042");
    assert_eq!(config.sensor_tolerance(), 15);
    assert_eq!(config.package_tolerance(), 2.5);
    assert_eq!(config.tolerances(), Tolerances::new(15, 2.5));
    assert!(config.egress_enabled());
    assert_eq!(config.egress_file(), "out/results.jsonl");
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_partial_config_keeps_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[tolerance]\nsensor_grams = 5\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.sensor_tolerance(), 5);
    assert_eq!(config.package_tolerance(), 5.0);
    assert_eq!(config.machine_id(), "vending");
    assert!(!config.egress_enabled());
}

#[test]
fn test_negative_package_tolerance_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[tolerance]\npackage_percent = -1.0\n").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}

#[test]
fn test_malformed_config_is_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[tolerance\nsensor_grams = ").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.sensor_tolerance(), 10);
    assert_eq!(config.package_tolerance(), 5.0);
    assert_eq!(config.config_file(), "default");
}

// The only test in this binary that touches CONFIG_FILE
#[test]
fn test_config_path_resolution_order() {
    let mut env_file = NamedTempFile::new().unwrap();
    env_file.write_all(b"[machine]\nid = \"vm-env\"\n").unwrap();
    env_file.flush().unwrap();
    let env_path = env_file.path().display().to_string();

    std::env::set_var(CONFIG_FILE_ENV, &env_path);

    // No --config: the environment variable picks the file
    assert_eq!(Config::resolve_config_path(None), env_path);
    let config = Config::load(None);
    assert_eq!(config.machine_id(), "vm-env");
    assert_eq!(config.config_file(), env_path);

    // --config wins over the environment
    let mut cli_file = NamedTempFile::new().unwrap();
    cli_file.write_all(b"[machine]\nid = \"vm-cli\"\n").unwrap();
    cli_file.flush().unwrap();
    let cli_path = cli_file.path().display().to_string();
    assert_eq!(Config::load(Some(cli_path.as_str())).machine_id(), "vm-cli");

    std::env::remove_var(CONFIG_FILE_ENV);
    assert_eq!(Config::resolve_config_path(None), DEFAULT_CONFIG_PATH);
}
