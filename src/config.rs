//! # Configuration
//!
//! Settings for the serial ports, the device controller and the bus bridge.
//! Every field has a default, so a configuration file only needs to name what
//! it changes:
//!
//! ```json
//! { "device": { "update_interval_ms": 5000 }, "bridge": { "logging_enabled": false } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BRIDGE_HEX_CAP, BRIDGE_IDLE_TIMEOUT_MS, BRIDGE_RX_CAPACITY, BRIDGE_SETTLE_US,
    DEFAULT_UPDATE_INTERVAL_MS, DEVICE_IDLE_TIMEOUT_MS, DEVICE_RX_CAPACITY, TIN_INFO_FRAME_LEN,
};
use crate::error::TinBusError;
use crate::tinbus::serial::SerialConfig;

const DEVICE_RX_CAPACITY_MAX: usize = 255;
const BRIDGE_RX_CAPACITY_MAX: usize = 4096;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TinBusConfig {
    pub serial: SerialConfig,
    pub device: DeviceConfig,
    pub bridge: BridgeConfig,
    /// Host loop cadence.
    pub tick_interval_ms: u64,
}

impl Default for TinBusConfig {
    fn default() -> Self {
        TinBusConfig {
            serial: SerialConfig::default(),
            device: DeviceConfig::default(),
            bridge: BridgeConfig::default(),
            tick_interval_ms: 10,
        }
    }
}

/// Device controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Status poll interval.
    pub update_interval_ms: u64,
    pub rx_capacity: usize,
    pub idle_timeout_ms: u64,
    /// Drop info frames whose protected id parity does not match.
    pub validate_parity: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            rx_capacity: DEVICE_RX_CAPACITY,
            idle_timeout_ms: DEVICE_IDLE_TIMEOUT_MS,
            validate_parity: false,
        }
    }
}

/// Bus bridge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge enable flag.
    pub proxy_mode: bool,
    /// Diagnostic decoding and text logging of forwarded frames.
    pub logging_enabled: bool,
    pub rx_capacity: usize,
    pub idle_timeout_ms: u64,
    pub settle_us: u64,
    pub hex_cap: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            proxy_mode: true,
            logging_enabled: true,
            rx_capacity: BRIDGE_RX_CAPACITY,
            idle_timeout_ms: BRIDGE_IDLE_TIMEOUT_MS,
            settle_us: BRIDGE_SETTLE_US,
            hex_cap: BRIDGE_HEX_CAP,
        }
    }
}

impl TinBusConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, TinBusError> {
        let config: TinBusConfig =
            serde_json::from_str(json).map_err(|e| TinBusError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TinBusError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TinBusError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), TinBusError> {
        check_capacity("device.rx_capacity", self.device.rx_capacity, DEVICE_RX_CAPACITY_MAX)?;
        check_capacity("bridge.rx_capacity", self.bridge.rx_capacity, BRIDGE_RX_CAPACITY_MAX)?;

        let intervals = [
            ("device.update_interval_ms", self.device.update_interval_ms),
            ("device.idle_timeout_ms", self.device.idle_timeout_ms),
            ("bridge.idle_timeout_ms", self.bridge.idle_timeout_ms),
            ("serial.baudrate", self.serial.baudrate as u64),
            ("tick_interval_ms", self.tick_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(TinBusError::ConfigError(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }
}

fn check_capacity(name: &str, value: usize, max: usize) -> Result<(), TinBusError> {
    if !(TIN_INFO_FRAME_LEN..=max).contains(&value) {
        return Err(TinBusError::ConfigError(format!(
            "{name} must be within {TIN_INFO_FRAME_LEN}..={max}, got {value}"
        )));
    }
    Ok(())
}
