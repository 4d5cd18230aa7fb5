//! TIN Bus Protocol Constants
//!
//! Wire-level constants of the LIN-style framing and the appliance command set,
//! plus the default tuning values of the receive path.

use std::time::Duration;

// ----------------------------------------------------------------------------
// Framing
// ----------------------------------------------------------------------------

/// Sync byte following the break indicator
pub const LIN_SYNC_BYTE: u8 = 0x55;

/// Byte written as the break indicator
pub const LIN_BREAK_BYTE: u8 = 0x00;

/// Mask for the 6-bit frame identifier inside a protected id
pub const LIN_ID_MASK: u8 = 0x3F;

/// Largest frame identifier
pub const LIN_MAX_ID: u8 = 0x3F;

/// Maximum number of data bytes in a frame
pub const LIN_MAX_DATA_LEN: usize = 8;

// ----------------------------------------------------------------------------
// Frame identifiers
// ----------------------------------------------------------------------------

pub const TIN_FRAME_AIR_HEATER_CMD: u8 = 0x03;
pub const TIN_FRAME_WATER_HEATER_CMD: u8 = 0x04;
pub const TIN_FRAME_FUEL_CMD: u8 = 0x05;
pub const TIN_FRAME_ELECTRO_CMD: u8 = 0x06;
pub const TIN_FRAME_VENT_CMD: u8 = 0x07;
pub const TIN_FRAME_INFO: u8 = 0x16;

/// Bytes needed before an info frame is dispatched (sync + pid + 8 payload bytes)
pub const TIN_INFO_FRAME_LEN: usize = 10;

/// Minimum length of a command frame for diagnostic temperature decoding
pub const TIN_CMD_DIAG_MIN_LEN: usize = 6;

// Command value widths
pub const TIN_FUEL_MODE_MASK: u8 = 0x03;
pub const TIN_ELECTRO_POWER_MASK: u8 = 0x03;
pub const TIN_VENT_SPEED_MASK: u8 = 0x07;

/// Highest electro power level accepted from a status frame
pub const TIN_ELECTRO_POWER_MAX: u8 = 3;

/// Highest vent speed accepted from a status frame
pub const TIN_VENT_SPEED_MAX: u8 = 7;

// ----------------------------------------------------------------------------
// Temperatures
// ----------------------------------------------------------------------------

/// Offset between degrees Celsius and kelvin
pub const KELVIN_OFFSET: f64 = 273.15;

pub const AIR_TEMP_MIN_C: f32 = 5.0;
pub const AIR_TEMP_MAX_C: f32 = 35.0;
pub const WATER_TEMP_MIN_C: f32 = 20.0;
pub const WATER_TEMP_MAX_C: f32 = 70.0;

// ----------------------------------------------------------------------------
// Timing and buffers
// ----------------------------------------------------------------------------

/// Pause between the break indicator and the sync byte
pub const BREAK_PAUSE: Duration = Duration::from_micros(100);

/// Pause after each transmitted frame
pub const INTER_FRAME_PAUSE: Duration = Duration::from_millis(10);

/// Default status poll interval in milliseconds
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 10_000;

/// Receive buffer size of a single-device receiver
pub const DEVICE_RX_CAPACITY: usize = 32;

/// Idle threshold of a single-device receiver in milliseconds
pub const DEVICE_IDLE_TIMEOUT_MS: u64 = 100;

/// Receive buffer size of each bridge direction
pub const BRIDGE_RX_CAPACITY: usize = 256;

/// Idle threshold of a bridge receiver in milliseconds
pub const BRIDGE_IDLE_TIMEOUT_MS: u64 = 200;

/// Quiet time after which a synced bridge frame is treated as complete
pub const BRIDGE_SETTLE_US: u64 = 500;

/// Maximum number of bytes rendered as hex in a bridge log line
pub const BRIDGE_HEX_CAP: usize = 32;
