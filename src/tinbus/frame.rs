//! # TIN Bus Frames
//!
//! Frame-level primitives of the LIN-style framing used by the TIN bus:
//!
//! - protected identifier encoding (6-bit id + 2 parity bits),
//! - the classic checksum (data bytes only, identifier not covered),
//! - the known frame identifiers and their human-readable names,
//! - [`TinFrame`], an outbound frame that packs into `sync | pid | data | checksum`.
//!
//! The break indicator and the transmit pauses are not part of the packed bytes;
//! they belong to the transmission sequence in [`crate::tinbus::serial`].
//!
//! ```rust
//! use tin_bus::tinbus::frame::{pack_frame, TinFrame};
//!
//! let frame = TinFrame::new(0x03, &[0x82, 0x0B]).unwrap();
//! assert_eq!(&pack_frame(&frame)[..], &[0x55, 0x83, 0x82, 0x0B, 0x8D]);
//! ```

use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::constants::{
    LIN_ID_MASK, LIN_MAX_DATA_LEN, LIN_MAX_ID, LIN_SYNC_BYTE, TIN_FRAME_AIR_HEATER_CMD,
    TIN_FRAME_ELECTRO_CMD, TIN_FRAME_FUEL_CMD, TIN_FRAME_INFO, TIN_FRAME_VENT_CMD,
    TIN_FRAME_WATER_HEATER_CMD,
};
use crate::error::TinBusError;

/// Computes the protected identifier for a 6-bit frame id.
///
/// Parity bit 6 is the XOR of id bits {0,1,2,4}, parity bit 7 the XOR of id
/// bits {1,3,4,5}. Bits above the 6-bit range are ignored.
pub fn encode_protected_id(frame_id: u8) -> u8 {
    let id = frame_id & LIN_ID_MASK;
    let p0 = (id ^ (id >> 1) ^ (id >> 2) ^ (id >> 4)) & 0x01;
    let p1 = ((id >> 1) ^ (id >> 3) ^ (id >> 4) ^ (id >> 5)) & 0x01;
    id | (p0 << 6) | (p1 << 7)
}

/// Extracts the frame id from a protected identifier. Parity is not checked.
pub fn decode_protected_id(pid: u8) -> u8 {
    pid & LIN_ID_MASK
}

/// Extracts the frame id and verifies the parity bits.
pub fn validate_protected_id(pid: u8) -> Result<u8, TinBusError> {
    let id = decode_protected_id(pid);
    let expected = encode_protected_id(id);
    if expected != pid {
        return Err(TinBusError::ParityMismatch {
            received: pid,
            expected,
        });
    }
    Ok(id)
}

/// Classic checksum: 8-bit wrapping sum of the data bytes.
///
/// The accumulator never exceeds 255, so there is no end-around carry step.
pub fn calculate_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Compares a received checksum against the data it covers.
pub fn verify_checksum(data: &[u8], received: u8) -> Result<(), TinBusError> {
    let calculated = calculate_checksum(data);
    if calculated != received {
        return Err(TinBusError::InvalidChecksum {
            expected: received,
            calculated,
        });
    }
    Ok(())
}

/// Frame identifiers known to the appliance protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameId {
    AirHeaterCmd = TIN_FRAME_AIR_HEATER_CMD,
    WaterHeaterCmd = TIN_FRAME_WATER_HEATER_CMD,
    FuelCmd = TIN_FRAME_FUEL_CMD,
    ElectroCmd = TIN_FRAME_ELECTRO_CMD,
    VentCmd = TIN_FRAME_VENT_CMD,
    Info = TIN_FRAME_INFO,
}

impl FrameId {
    /// Looks up a raw 6-bit id. Unknown ids yield `None`.
    pub fn from_u8(id: u8) -> Option<Self> {
        match id {
            TIN_FRAME_AIR_HEATER_CMD => Some(FrameId::AirHeaterCmd),
            TIN_FRAME_WATER_HEATER_CMD => Some(FrameId::WaterHeaterCmd),
            TIN_FRAME_FUEL_CMD => Some(FrameId::FuelCmd),
            TIN_FRAME_ELECTRO_CMD => Some(FrameId::ElectroCmd),
            TIN_FRAME_VENT_CMD => Some(FrameId::VentCmd),
            TIN_FRAME_INFO => Some(FrameId::Info),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            FrameId::AirHeaterCmd => "Air Heater Command",
            FrameId::WaterHeaterCmd => "Water Heater Command",
            FrameId::FuelCmd => "Fuel Command",
            FrameId::ElectroCmd => "Electro Command",
            FrameId::VentCmd => "Vent Command",
            FrameId::Info => "Info (Status)",
        }
    }
}

/// Human-readable name for any raw frame id.
pub fn frame_name(id: u8) -> &'static str {
    FrameId::from_u8(id).map_or("Unknown", FrameId::name)
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X} ({})", self.as_u8(), self.name())
    }
}

/// An outbound frame: identifier plus up to 8 data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TinFrame {
    id: u8,
    data: Vec<u8>,
}

impl TinFrame {
    /// Builds a frame, rejecting ids above 63 and more than 8 data bytes.
    pub fn new(id: u8, data: &[u8]) -> Result<Self, TinBusError> {
        if id > LIN_MAX_ID {
            return Err(TinBusError::InvalidFrameId(id));
        }
        if data.len() > LIN_MAX_DATA_LEN {
            return Err(TinBusError::DataTooLong(data.len()));
        }
        Ok(TinFrame {
            id,
            data: data.to_vec(),
        })
    }

    pub(crate) fn from_known(id: FrameId, data: &[u8]) -> Self {
        TinFrame {
            id: id.as_u8(),
            data: data.to_vec(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn protected_id(&self) -> u8 {
        encode_protected_id(self.id)
    }

    pub fn checksum(&self) -> u8 {
        calculate_checksum(&self.data)
    }

    /// Length of the packed frame: sync + pid + data + checksum.
    pub fn encoded_len(&self) -> usize {
        2 + self.data.len() + 1
    }
}

/// Packs a frame into `sync | pid | data | checksum`.
pub fn pack_frame(frame: &TinFrame) -> BytesMut {
    let mut buf = BytesMut::with_capacity(frame.encoded_len());
    buf.put_u8(LIN_SYNC_BYTE);
    buf.put_u8(frame.protected_id());
    buf.put_slice(frame.data());
    buf.put_u8(frame.checksum());
    buf
}
