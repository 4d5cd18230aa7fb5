//! Tests for loading `TinBusConfig` from JSON files.

use std::io::Write;

use tempfile::NamedTempFile;
use tin_bus::config::{BridgeConfig, DeviceConfig, TinBusConfig};
use tin_bus::TinBusError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Tests a file that overrides a few values in each section.
#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"{
            "serial": { "baudrate": 9600 },
            "device": { "update_interval_ms": 2000, "validate_parity": true },
            "bridge": { "proxy_mode": false, "hex_cap": 16 },
            "tick_interval_ms": 5
        }"#,
    );
    let config = TinBusConfig::from_file(file.path()).unwrap();

    assert_eq!(config.serial.baudrate, 9600);
    assert_eq!(config.serial.read_timeout_ms, 10);
    assert_eq!(config.device.update_interval_ms, 2000);
    assert!(config.device.validate_parity);
    assert_eq!(config.device.rx_capacity, DeviceConfig::default().rx_capacity);
    assert!(!config.bridge.proxy_mode);
    assert!(config.bridge.logging_enabled);
    assert_eq!(config.bridge.hex_cap, 16);
    assert_eq!(config.tick_interval_ms, 5);
}

/// Tests that an empty object yields the defaults.
#[test]
fn test_empty_file_defaults() {
    let file = write_config("{}");
    let config = TinBusConfig::from_file(file.path()).unwrap();
    assert_eq!(config.device, DeviceConfig::default());
    assert_eq!(config.bridge, BridgeConfig::default());
    assert_eq!(config.serial.baudrate, 19200);
}

/// Tests that malformed JSON and invalid values are configuration errors.
#[test]
fn test_invalid_files() {
    let file = write_config("{ not json");
    assert!(matches!(
        TinBusConfig::from_file(file.path()),
        Err(TinBusError::ConfigError(_))
    ));

    let file = write_config(r#"{ "bridge": { "rx_capacity": 10000 } }"#);
    assert!(matches!(
        TinBusConfig::from_file(file.path()),
        Err(TinBusError::ConfigError(_))
    ));
}

/// Tests that a missing file is reported with its path.
#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    match TinBusConfig::from_file(&path) {
        Err(TinBusError::ConfigError(msg)) => assert!(msg.contains("absent.json")),
        other => panic!("expected config error, got {other:?}"),
    }
}
