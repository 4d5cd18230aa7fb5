//! # TIN Bus Serial Channels
//!
//! The [`ChannelIo`] capability is everything the protocol code needs from a
//! transport: a non-blocking `available`/`read` pair, byte writes and flush.
//! Device controllers and bridges are generic over it, so the same code runs on
//! a real UART ([`SerialChannel`]) or on
//! [`MockSerialPort`](crate::tinbus::serial_mock::MockSerialPort) in tests.
//!
//! [`send_frame`] implements the shared transmit sequence:
//! break, short pause, sync, protected id, data, checksum, inter-frame pause.

use std::io::{Read, Write};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{BREAK_PAUSE, INTER_FRAME_PAUSE, LIN_BREAK_BYTE};
use crate::error::TinBusError;
use crate::tinbus::frame::{pack_frame, TinFrame};
use crate::util::clock::Clock;

/// Byte-oriented access to one bus segment.
pub trait ChannelIo {
    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> usize;

    /// Reads one byte, `None` if nothing is buffered.
    fn read(&mut self) -> Option<u8>;

    fn write_byte(&mut self, byte: u8) -> Result<(), TinBusError>;

    fn flush(&mut self) -> Result<(), TinBusError>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TinBusError> {
        for b in bytes {
            self.write_byte(*b)?;
        }
        Ok(())
    }

    /// Signals the start of a frame. The TIN bus transmits the break as a 0x00 byte.
    fn send_break(&mut self) -> Result<(), TinBusError> {
        self.write_byte(LIN_BREAK_BYTE)
    }
}

impl<T: ChannelIo + ?Sized> ChannelIo for Box<T> {
    fn available(&mut self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TinBusError> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<(), TinBusError> {
        (**self).flush()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TinBusError> {
        (**self).write_all(bytes)
    }

    fn send_break(&mut self) -> Result<(), TinBusError> {
        (**self).send_break()
    }
}

/// Transmits one frame with break and pauses.
///
/// Purely output-side; the receive path is not consulted.
pub fn send_frame<P, C>(port: &mut P, clock: &C, frame: &TinFrame) -> Result<(), TinBusError>
where
    P: ChannelIo + ?Sized,
    C: Clock + ?Sized,
{
    port.send_break()?;
    clock.delay(BREAK_PAUSE);

    let bytes = pack_frame(frame);
    port.write_all(&bytes)?;
    port.flush()?;

    clock.delay(INTER_FRAME_PAUSE);
    debug!(
        "Frame 0x{:02X} sent, {} data bytes",
        frame.id(),
        frame.data().len()
    );
    Ok(())
}

/// Configuration for serial connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baudrate: u32,
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: 19200,
            read_timeout_ms: 10,
        }
    }
}

/// A UART opened through `tokio-serial`, used synchronously from the tick loop.
pub struct SerialChannel {
    port: Box<dyn tokio_serial::SerialPort>,
    name: String,
}

impl SerialChannel {
    /// Opens the port 8N1 at the configured baud rate.
    pub fn open(port_name: &str, config: &SerialConfig) -> Result<Self, TinBusError> {
        let port = tokio_serial::new(port_name, config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|e| TinBusError::SerialPortError(format!("{port_name}: {e}")))?;

        Ok(SerialChannel {
            port,
            name: port_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ChannelIo for SerialChannel {
    fn available(&mut self) -> usize {
        match self.port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(e) => {
                warn!("{}: cannot query receive buffer: {}", self.name, e);
                0
            }
        }
    }

    fn read(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => None,
            Err(e) => {
                warn!("{}: read failed: {}", self.name, e);
                None
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TinBusError> {
        self.port
            .write_all(&[byte])
            .map_err(|e| TinBusError::SerialPortError(e.to_string()))
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TinBusError> {
        self.port
            .write_all(bytes)
            .map_err(|e| TinBusError::SerialPortError(e.to_string()))
    }

    fn flush(&mut self) -> Result<(), TinBusError> {
        Write::flush(&mut self.port).map_err(|e| TinBusError::SerialPortError(e.to_string()))
    }
}
