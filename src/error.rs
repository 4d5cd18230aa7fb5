//! # TIN Bus Error Handling
//!
//! This module defines the TinBusError enum, which represents the different error
//! types that can occur in the tin-bus crate.

use thiserror::Error;

/// Represents the different error types that can occur in the TIN bus crate.
#[derive(Debug, Error)]
pub enum TinBusError {
    /// Indicates an error related to the serial channel.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// A frame was shorter than its layout requires.
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    /// A frame identifier outside the 6-bit range.
    #[error("Invalid frame id: 0x{0:02X}")]
    InvalidFrameId(u8),

    /// More data bytes than a frame can carry.
    #[error("Frame data too long: {0} bytes")]
    DataTooLong(usize),

    /// The parity bits of a protected identifier do not match its id.
    #[error("Protected id parity mismatch: received 0x{received:02X}, expected 0x{expected:02X}")]
    ParityMismatch { received: u8, expected: u8 },

    /// Indicates a checksum mismatch.
    #[error("Invalid checksum: expected {expected}, calculated {calculated}")]
    InvalidChecksum { expected: u8, calculated: u8 },

    /// A command argument outside its accepted range.
    #[error("{what} out of range: {value:.1} (valid {min:.1}..={max:.1})")]
    OutOfRange {
        what: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Indicates a nom parsing error.
    #[error("Nom error: {0}")]
    NomError(String),

    /// Indicates an invalid hexadecimal string was provided.
    #[error("Invalid hexadecimal string: {0}")]
    InvalidHexString(String),
}

impl From<std::io::Error> for TinBusError {
    fn from(e: std::io::Error) -> Self {
        TinBusError::SerialPortError(e.to_string())
    }
}
