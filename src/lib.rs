//! # tin-bus - A Rust Crate for TIN Bus Heater Communication
//!
//! The tin-bus crate implements the TIN bus, the command/status protocol used by
//! combined air/water heaters and their control panels. It is layered on LIN-style
//! framing: a break, the sync byte `0x55`, a protected identifier, up to eight data
//! bytes and a classic checksum.
//!
//! ## Features
//!
//! - Encode and decode protected identifiers and checksums
//! - Reassemble frames from a raw byte stream with configurable idle-timeout policies
//! - Encode heater commands (air/water temperature, fuel mode, electro power, vent speed)
//!   and decode the 10-byte status frame
//! - Drive a heater with [`DeviceController`], publishing status fields to optional sinks
//! - Bridge a control panel and a heater on separate segments with [`BusBridge`],
//!   forwarding frames verbatim and decoding them for diagnostics
//! - Support for logging, configuration files and error handling
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! tin-bus = "0.1.0"
//! ```
//!
//! ```rust,no_run
//! use tin_bus::{open_channel, BusComponent, DeviceController, SystemClock, TinBusConfig};
//!
//! let config = TinBusConfig::default();
//! let port = open_channel("/dev/ttyUSB0", &config).unwrap();
//! let mut device = DeviceController::new(port, SystemClock::new(), config.device.clone());
//! device.setup();
//! device.set_water_temperature(55.0).unwrap();
//! device.tick().unwrap();
//! ```

pub mod bridge;
pub mod component;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod logging;
pub mod sinks;
pub mod tinbus;
pub mod util;

pub use crate::error::TinBusError;
pub use crate::logging::{init_logger, log_error, log_info};

pub use bridge::{BridgeStats, BusBridge, Direction};
pub use component::BusComponent;
pub use config::{BridgeConfig, DeviceConfig, TinBusConfig};
pub use device::{DeviceController, DeviceSinks};
pub use sinks::{BooleanSink, EnumSink, LogSink, NumericSink, Recorder, TextSink};
pub use tinbus::codec::{diagnose_frame, FrameDiagnostics};
pub use tinbus::{
    send_frame, AssemblerEvent, ChannelIo, Command, DeviceStatus, FrameAssembler, FrameId,
    FuelMode, SerialChannel, SerialConfig, TimeoutPolicy, TinFrame,
};
pub use util::clock::{Clock, MockClock, SystemClock};

/// Open a serial channel using the serial settings of `config`.
///
/// # Arguments
/// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
///
/// # Returns
/// * `Ok(SerialChannel)` - Open channel, 8N1 at the configured baud rate
/// * `Err(TinBusError)` - The port could not be opened
pub fn open_channel(port: &str, config: &TinBusConfig) -> Result<SerialChannel, TinBusError> {
    SerialChannel::open(port, &config.serial)
}

/// Decode a hex-encoded frame capture for display.
///
/// Accepts separators and whitespace, e.g. `"55 56 BB 0B ..."`.
pub fn decode_capture(hex: &str) -> Result<FrameDiagnostics, TinBusError> {
    let bytes = util::hex::decode_hex(hex)
        .map_err(|e| TinBusError::InvalidHexString(e.to_string()))?;
    Ok(diagnose_frame(&bytes))
}
