//! The tinbus module contains the core TIN bus protocol implementation: frame
//! primitives, byte-stream reassembly, the command/status codec and the serial
//! channel abstraction.

pub mod assembler;
pub mod codec;
pub mod frame;
pub mod serial;
pub mod serial_mock;

pub use assembler::{AssemblerEvent, FrameAssembler, TimeoutPolicy};
pub use codec::{Command, DeviceStatus, FuelMode};
pub use frame::{FrameId, TinFrame};
pub use serial::{send_frame, ChannelIo, SerialChannel, SerialConfig};
