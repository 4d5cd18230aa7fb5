//! # TIN Bus Command/Status Codec
//!
//! Maps appliance commands to outbound frames and decodes the info (status)
//! frame into a [`DeviceStatus`]. Also provides a read-only diagnostic decoder
//! for sniffed traffic; its output is meant for logs only and never feeds the
//! device's published state.
//!
//! Temperatures travel as kelvin x 10, little endian:
//!
//! ```rust
//! use tin_bus::tinbus::codec::{celsius_to_kelvin10, kelvin10_to_celsius};
//!
//! assert_eq!(celsius_to_kelvin10(21.5), 2946);
//! assert!((kelvin10_to_celsius(3003) - 27.15).abs() < 0.01);
//! ```

use std::fmt;

use bitflags::bitflags;
use nom::number::complete::{le_u16, u8 as byte};
use nom::IResult;
use serde::Serialize;

use crate::constants::{
    AIR_TEMP_MAX_C, AIR_TEMP_MIN_C, KELVIN_OFFSET, LIN_SYNC_BYTE, TIN_CMD_DIAG_MIN_LEN,
    TIN_ELECTRO_POWER_MASK, TIN_ELECTRO_POWER_MAX, TIN_FUEL_MODE_MASK, TIN_INFO_FRAME_LEN,
    TIN_VENT_SPEED_MASK, TIN_VENT_SPEED_MAX, WATER_TEMP_MAX_C, WATER_TEMP_MIN_C,
};
use crate::error::TinBusError;
use crate::tinbus::frame::{decode_protected_id, frame_name, FrameId, TinFrame};

bitflags! {
    /// Energy sources of the heater (2-bit field).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct FuelMode: u8 {
        const GAS = 0x01;
        const ELECTRO = 0x02;
    }
}

/// Option labels for the vent speed selector, indexed by speed.
pub const VENT_SPEED_OPTIONS: [&str; 8] = [
    "Off", "Level 1", "Level 2", "Level 3", "Level 4", "Level 5", "Level 6", "Level 7",
];

/// Option labels for the electro power selector, indexed by level.
pub const ELECTRO_POWER_OPTIONS: [&str; 4] = ["Off", "Level 1", "Level 2", "Level 3"];

/// Converts degrees Celsius to kelvin x 10, rounding half to even.
pub fn celsius_to_kelvin10(celsius: f32) -> u16 {
    let k10 = ((celsius as f64 + KELVIN_OFFSET) * 10.0).round_ties_even();
    k10.clamp(0.0, u16::MAX as f64) as u16
}

/// Converts kelvin x 10 to degrees Celsius.
pub fn kelvin10_to_celsius(kelvin10: u16) -> f32 {
    (kelvin10 as f64 / 10.0 - KELVIN_OFFSET) as f32
}

/// A command the controller can send to the appliance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetAirTemperature(f32),
    SetWaterTemperature(f32),
    SetFuelMode(FuelMode),
    SetElectroPower(u8),
    SetVentSpeed(u8),
    RequestStatus,
}

impl Command {
    pub fn frame_id(&self) -> FrameId {
        match self {
            Command::SetAirTemperature(_) => FrameId::AirHeaterCmd,
            Command::SetWaterTemperature(_) => FrameId::WaterHeaterCmd,
            Command::SetFuelMode(_) => FrameId::FuelCmd,
            Command::SetElectroPower(_) => FrameId::ElectroCmd,
            Command::SetVentSpeed(_) => FrameId::VentCmd,
            Command::RequestStatus => FrameId::Info,
        }
    }

    /// Encodes the command into a frame.
    ///
    /// Temperatures outside their accepted range are rejected with
    /// [`TinBusError::OutOfRange`]; single-byte values are masked to the
    /// command's bit width.
    pub fn encode(&self) -> Result<TinFrame, TinBusError> {
        let id = self.frame_id();
        let frame = match *self {
            Command::SetAirTemperature(c) => {
                check_range("Air temperature", c, AIR_TEMP_MIN_C, AIR_TEMP_MAX_C)?;
                TinFrame::from_known(id, &celsius_to_kelvin10(c).to_le_bytes())
            }
            Command::SetWaterTemperature(c) => {
                check_range("Water temperature", c, WATER_TEMP_MIN_C, WATER_TEMP_MAX_C)?;
                TinFrame::from_known(id, &celsius_to_kelvin10(c).to_le_bytes())
            }
            Command::SetFuelMode(mode) => {
                TinFrame::from_known(id, &[mode.bits() & TIN_FUEL_MODE_MASK])
            }
            Command::SetElectroPower(level) => {
                TinFrame::from_known(id, &[level & TIN_ELECTRO_POWER_MASK])
            }
            Command::SetVentSpeed(speed) => {
                TinFrame::from_known(id, &[speed & TIN_VENT_SPEED_MASK])
            }
            Command::RequestStatus => TinFrame::from_known(id, &[0x00]),
        };
        Ok(frame)
    }
}

fn check_range(what: &'static str, value: f32, min: f32, max: f32) -> Result<(), TinBusError> {
    // NaN fails both comparisons, so test for containment
    if !(min..=max).contains(&value) {
        return Err(TinBusError::OutOfRange {
            what,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Appliance state decoded from an info frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub air_temperature: f32,
    pub water_temperature: f32,
    pub status: u8,
    pub fuel_mode: FuelMode,
    /// Raw fuel mode byte as received.
    pub fuel_mode_raw: u8,
    /// `None` when the received level is out of range.
    pub electro_power: Option<u8>,
    /// `None` when the received speed is out of range.
    pub vent_speed: Option<u8>,
}

impl DeviceStatus {
    /// Any energy source active.
    pub fn power(&self) -> bool {
        self.fuel_mode_raw & TIN_FUEL_MODE_MASK != 0
    }

    pub fn fuel_gas(&self) -> bool {
        self.fuel_mode.contains(FuelMode::GAS)
    }

    pub fn fuel_electro(&self) -> bool {
        self.fuel_mode.contains(FuelMode::ELECTRO)
    }
}

struct RawStatus {
    air_k10: u16,
    water_k10: u16,
    status: u8,
    fuel_mode: u8,
    electro_power: u8,
    vent_speed: u8,
}

/// Parses the info payload that follows sync and pid.
fn parse_status_payload(input: &[u8]) -> IResult<&[u8], RawStatus> {
    let (input, air_k10) = le_u16(input)?;
    let (input, water_k10) = le_u16(input)?;
    let (input, status) = byte(input)?;
    let (input, fuel_mode) = byte(input)?;
    let (input, electro_power) = byte(input)?;
    let (input, vent_speed) = byte(input)?;
    Ok((
        input,
        RawStatus {
            air_k10,
            water_k10,
            status,
            fuel_mode,
            electro_power,
            vent_speed,
        },
    ))
}

/// Decodes a received info frame (sync, pid, 8 payload bytes, optional checksum).
///
/// Only the length is checked here; callers decide whether the id matters.
pub fn decode_status(frame: &[u8]) -> Result<DeviceStatus, TinBusError> {
    if frame.len() < TIN_INFO_FRAME_LEN {
        return Err(TinBusError::FrameTooShort {
            expected: TIN_INFO_FRAME_LEN,
            actual: frame.len(),
        });
    }
    let (_, raw) = parse_status_payload(&frame[2..TIN_INFO_FRAME_LEN])
        .map_err(|e| TinBusError::NomError(format!("{e:?}")))?;

    Ok(DeviceStatus {
        air_temperature: kelvin10_to_celsius(raw.air_k10),
        water_temperature: kelvin10_to_celsius(raw.water_k10),
        status: raw.status,
        fuel_mode: FuelMode::from_bits_truncate(raw.fuel_mode),
        fuel_mode_raw: raw.fuel_mode,
        electro_power: (raw.electro_power <= TIN_ELECTRO_POWER_MAX).then_some(raw.electro_power),
        vent_speed: (raw.vent_speed <= TIN_VENT_SPEED_MAX).then_some(raw.vent_speed),
    })
}

/// Fields recovered by the diagnostic decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticDetail {
    /// Nothing decodable for this id/length.
    None,
    /// Temperature carried by a heater command.
    Temperature { kelvin10: u16, celsius: f32 },
    /// Temperatures and status byte of an info frame.
    Info {
        air_celsius: f32,
        water_celsius: f32,
        status: u8,
    },
}

/// Read-only analysis of a sniffed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDiagnostics {
    /// `None` if the bytes do not start with sync + pid.
    pub frame_id: Option<u8>,
    pub name: &'static str,
    pub len: usize,
    pub detail: DiagnosticDetail,
}

/// Decodes whatever can be recognised in a captured frame for logging.
pub fn diagnose_frame(data: &[u8]) -> FrameDiagnostics {
    if data.len() < 3 || data[0] != LIN_SYNC_BYTE {
        return FrameDiagnostics {
            frame_id: None,
            name: "Unsynced",
            len: data.len(),
            detail: DiagnosticDetail::None,
        };
    }

    let id = decode_protected_id(data[1]);
    let detail = match FrameId::from_u8(id) {
        Some(FrameId::AirHeaterCmd | FrameId::WaterHeaterCmd)
            if data.len() >= TIN_CMD_DIAG_MIN_LEN =>
        {
            let kelvin10 = u16::from_le_bytes([data[3], data[4]]);
            DiagnosticDetail::Temperature {
                kelvin10,
                celsius: kelvin10_to_celsius(kelvin10),
            }
        }
        Some(FrameId::Info) if data.len() >= TIN_INFO_FRAME_LEN => DiagnosticDetail::Info {
            air_celsius: kelvin10_to_celsius(u16::from_le_bytes([data[2], data[3]])),
            water_celsius: kelvin10_to_celsius(u16::from_le_bytes([data[4], data[5]])),
            status: data[6],
        },
        _ => DiagnosticDetail::None,
    };

    FrameDiagnostics {
        frame_id: Some(id),
        name: frame_name(id),
        len: data.len(),
        detail,
    }
}

impl fmt::Display for FrameDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frame_id {
            Some(id) => write!(f, "Frame 0x{:02X} ({}), {} bytes", id, self.name, self.len)?,
            None => write!(f, "{}, {} bytes", self.name, self.len)?,
        }
        match self.detail {
            DiagnosticDetail::None => Ok(()),
            DiagnosticDetail::Temperature { kelvin10, celsius } => {
                write!(f, ", temperature {celsius:.1}°C (0x{kelvin10:04X})")
            }
            DiagnosticDetail::Info {
                air_celsius,
                water_celsius,
                status,
            } => write!(
                f,
                ", air {air_celsius:.1}°C, water {water_celsius:.1}°C, status 0x{status:02X}"
            ),
        }
    }
}
