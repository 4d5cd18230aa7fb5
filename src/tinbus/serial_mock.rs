//! Mock serial channel for testing
//!
//! This module provides a mock channel that can be used to test the device
//! controller and the bus bridge without requiring actual hardware.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::constants::LIN_BREAK_BYTE;
use crate::error::TinBusError;
use crate::tinbus::frame::{pack_frame, TinFrame};
use crate::tinbus::serial::ChannelIo;

/// Mock serial channel that simulates bidirectional communication.
///
/// Clones share their buffers: keep one handle in the test and hand another to
/// the component under test.
#[derive(Clone)]
pub struct MockSerialPort {
    /// Data written to the port (outgoing)
    pub tx_buffer: Arc<Mutex<Vec<u8>>>,
    /// Data to be read from the port (incoming)
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Simulated error for the next write or flush
    pub next_error: Arc<Mutex<Option<io::Error>>>,
    flushes: Arc<Mutex<usize>>,
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSerialPort {
    pub fn new() -> Self {
        MockSerialPort {
            tx_buffer: Arc::new(Mutex::new(Vec::new())),
            rx_buffer: Arc::new(Mutex::new(VecDeque::new())),
            next_error: Arc::new(Mutex::new(None)),
            flushes: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        let mut rx = self.rx_buffer.lock().unwrap();
        rx.extend(data);
    }

    /// Queue a frame as a remote node would send it: break, then the packed frame.
    pub fn queue_frame(&self, id: u8, data: &[u8]) {
        let frame = TinFrame::new(id, data).unwrap();
        let mut bytes = vec![LIN_BREAK_BYTE];
        bytes.extend_from_slice(&pack_frame(&frame));
        self.queue_rx_data(&bytes);
    }

    /// Get data that was written to the port
    pub fn get_tx_data(&self) -> Vec<u8> {
        self.tx_buffer.lock().unwrap().clone()
    }

    /// Take and clear the written data
    pub fn take_tx_data(&self) -> Vec<u8> {
        std::mem::take(&mut *self.tx_buffer.lock().unwrap())
    }

    /// Bytes still waiting to be read
    pub fn rx_pending(&self) -> usize {
        self.rx_buffer.lock().unwrap().len()
    }

    /// Number of flush calls so far
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap()
    }

    /// Set an error to be returned on the next write or flush
    pub fn set_next_error(&self, error: io::Error) {
        *self.next_error.lock().unwrap() = Some(error);
    }

    fn take_error(&self) -> Result<(), TinBusError> {
        match self.next_error.lock().unwrap().take() {
            Some(e) => Err(TinBusError::from(e)),
            None => Ok(()),
        }
    }
}

impl ChannelIo for MockSerialPort {
    fn available(&mut self) -> usize {
        self.rx_pending()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx_buffer.lock().unwrap().pop_front()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), TinBusError> {
        self.take_error()?;
        self.tx_buffer.lock().unwrap().push(byte);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TinBusError> {
        self.take_error()?;
        *self.flushes.lock().unwrap() += 1;
        Ok(())
    }
}
