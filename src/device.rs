//! # Device Controller
//!
//! Drives a single heater on a TIN bus segment: transmits commands, polls the
//! status frame on a fixed cadence and publishes decoded status fields to the
//! configured sinks.
//!
//! ```rust
//! use tin_bus::config::DeviceConfig;
//! use tin_bus::device::DeviceController;
//! use tin_bus::tinbus::serial_mock::MockSerialPort;
//! use tin_bus::util::clock::MockClock;
//!
//! let port = MockSerialPort::new();
//! let mut device = DeviceController::new(port.clone(), MockClock::new(), DeviceConfig::default());
//! device.set_air_temperature(21.5).unwrap();
//! assert_eq!(port.get_tx_data(), vec![0x00, 0x55, 0x83, 0x82, 0x0B, 0x8D]);
//! ```

use std::time::Duration;

use log::{debug, info, warn};

use crate::component::BusComponent;
use crate::config::DeviceConfig;
use crate::constants::TIN_INFO_FRAME_LEN;
use crate::error::TinBusError;
use crate::sinks::{BooleanSink, EnumSink, NumericSink};
use crate::tinbus::assembler::{AssemblerEvent, FrameAssembler, TimeoutPolicy};
use crate::tinbus::codec::{decode_status, Command, DeviceStatus, FuelMode};
use crate::tinbus::frame::{decode_protected_id, validate_protected_id, FrameId};
use crate::tinbus::serial::{send_frame, ChannelIo};
use crate::util::clock::Clock;

/// Optional outputs for decoded status fields.
#[derive(Default)]
pub struct DeviceSinks {
    pub air_temperature: Option<Box<dyn NumericSink>>,
    pub water_temperature: Option<Box<dyn NumericSink>>,
    pub status: Option<Box<dyn NumericSink>>,
    pub power: Option<Box<dyn BooleanSink>>,
    pub fuel_gas: Option<Box<dyn BooleanSink>>,
    pub fuel_electro: Option<Box<dyn BooleanSink>>,
    pub vent_speed: Option<Box<dyn EnumSink>>,
    pub electro_power: Option<Box<dyn EnumSink>>,
}

impl DeviceSinks {
    fn publish(&mut self, status: &DeviceStatus) {
        publish_numeric(&mut self.air_temperature, status.air_temperature);
        publish_numeric(&mut self.water_temperature, status.water_temperature);
        publish_numeric(&mut self.status, status.status as f32);

        publish_bool(&mut self.power, status.power());
        publish_bool(&mut self.fuel_gas, status.fuel_gas());
        publish_bool(&mut self.fuel_electro, status.fuel_electro());

        if let Some(speed) = status.vent_speed {
            publish_enum(&mut self.vent_speed, speed);
        }
        if let Some(level) = status.electro_power {
            publish_enum(&mut self.electro_power, level);
        }
    }

    fn configured(&self) -> Vec<&'static str> {
        let slots = [
            ("air temperature", self.air_temperature.is_some()),
            ("water temperature", self.water_temperature.is_some()),
            ("status", self.status.is_some()),
            ("power", self.power.is_some()),
            ("fuel gas", self.fuel_gas.is_some()),
            ("fuel electro", self.fuel_electro.is_some()),
            ("vent speed", self.vent_speed.is_some()),
            ("electro power", self.electro_power.is_some()),
        ];
        slots
            .into_iter()
            .filter_map(|(name, set)| set.then_some(name))
            .collect()
    }
}

fn publish_numeric(sink: &mut Option<Box<dyn NumericSink>>, value: f32) {
    if let Some(s) = sink {
        s.publish(value);
    }
}

fn publish_bool(sink: &mut Option<Box<dyn BooleanSink>>, value: bool) {
    if let Some(s) = sink {
        s.publish(value);
    }
}

fn publish_enum(sink: &mut Option<Box<dyn EnumSink>>, index: u8) {
    if let Some(s) = sink {
        s.publish(index);
    }
}

/// Controller for one heater on one bus segment.
pub struct DeviceController<P: ChannelIo, C: Clock> {
    port: P,
    clock: C,
    config: DeviceConfig,
    assembler: FrameAssembler,
    sinks: DeviceSinks,
    last_update: Duration,
    pending: Vec<AssemblerEvent>,
}

impl<P: ChannelIo, C: Clock> DeviceController<P, C> {
    pub fn new(port: P, clock: C, config: DeviceConfig) -> Self {
        let assembler = FrameAssembler::new(
            config.rx_capacity,
            TimeoutPolicy::StrictDiscard,
            Duration::from_millis(config.idle_timeout_ms),
            None,
        );
        let last_update = clock.now();
        DeviceController {
            port,
            clock,
            config,
            assembler,
            sinks: DeviceSinks::default(),
            last_update,
            pending: Vec::new(),
        }
    }

    pub fn with_sinks(mut self, sinks: DeviceSinks) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn sinks_mut(&mut self) -> &mut DeviceSinks {
        &mut self.sinks
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// The receive-side assembler, for inspection.
    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    /// Sets the room temperature target, 5.0..=35.0 °C.
    pub fn set_air_temperature(&mut self, celsius: f32) -> Result<(), TinBusError> {
        self.send_command(Command::SetAirTemperature(celsius))
            .map(|_| ())
    }

    /// Sets the hot water temperature target, 20.0..=70.0 °C.
    pub fn set_water_temperature(&mut self, celsius: f32) -> Result<(), TinBusError> {
        self.send_command(Command::SetWaterTemperature(celsius))
            .map(|_| ())
    }

    pub fn set_fuel_mode(&mut self, mode: FuelMode) -> Result<(), TinBusError> {
        self.send_command(Command::SetFuelMode(mode)).map(|_| ())
    }

    pub fn set_electro_power(&mut self, level: u8) -> Result<(), TinBusError> {
        self.send_command(Command::SetElectroPower(level)).map(|_| ())
    }

    pub fn set_vent_speed(&mut self, speed: u8) -> Result<(), TinBusError> {
        self.send_command(Command::SetVentSpeed(speed)).map(|_| ())
    }

    /// Asks the heater for an info frame.
    pub fn request_status(&mut self) -> Result<(), TinBusError> {
        self.send_command(Command::RequestStatus).map(|_| ())
    }

    /// Encodes and transmits a command.
    ///
    /// Returns `Ok(false)` when the command was rejected for an out-of-range
    /// argument; nothing is transmitted in that case. Only channel failures
    /// are returned as errors.
    pub fn send_command(&mut self, command: Command) -> Result<bool, TinBusError> {
        let frame = match command.encode() {
            Ok(frame) => frame,
            Err(e @ TinBusError::OutOfRange { .. }) => {
                warn!("{e}, command not sent");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        send_frame(&mut self.port, &self.clock, &frame)?;

        match command {
            Command::SetAirTemperature(c) | Command::SetWaterTemperature(c) => info!(
                "{} set: {:.1}°C (0x{:02X}{:02X})",
                command.frame_id().name(),
                c,
                frame.data()[1],
                frame.data()[0]
            ),
            Command::RequestStatus => debug!("Status requested"),
            _ => info!(
                "{} set: {}",
                command.frame_id().name(),
                frame.data()[0]
            ),
        }
        Ok(true)
    }

    /// Handles a frame reported by the assembler.
    ///
    /// Only info frames of at least 10 bytes are decoded; anything else is ignored.
    pub fn on_frame_ready(&mut self, frame: &[u8]) {
        if frame.len() < TIN_INFO_FRAME_LEN {
            return;
        }
        let id = if self.config.validate_parity {
            match validate_protected_id(frame[1]) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Dropping frame: {e}");
                    return;
                }
            }
        } else {
            decode_protected_id(frame[1])
        };
        if id != FrameId::Info.as_u8() {
            return;
        }

        match decode_status(frame) {
            Ok(status) => {
                debug!(
                    "Status received: air={:.1}°C, water={:.1}°C, status=0x{:02X}",
                    status.air_temperature, status.water_temperature, status.status
                );
                self.sinks.publish(&status);
            }
            Err(e) => warn!("Status frame rejected: {e}"),
        }
    }

    /// Drains the channel into the assembler and handles completed frames.
    pub fn process_input(&mut self) {
        let now = self.clock.now();
        let mut events = std::mem::take(&mut self.pending);

        while self.port.available() > 0 {
            let Some(byte) = self.port.read() else {
                break;
            };
            self.assembler.push(byte, now, |ev| events.push(ev));
        }
        self.assembler.poll(now, |ev| events.push(ev));

        for event in events.drain(..) {
            if let AssemblerEvent::FrameReady(frame) = event {
                self.on_frame_ready(&frame);
            }
        }
        self.pending = events;
    }
}

impl<P: ChannelIo, C: Clock> BusComponent for DeviceController<P, C> {
    fn setup(&mut self) {
        info!("Setting up TIN bus device controller...");
        self.last_update = self.clock.now();
        self.assembler.reset();
    }

    fn tick(&mut self) -> Result<(), TinBusError> {
        self.process_input();

        let now = self.clock.now();
        let interval = Duration::from_millis(self.config.update_interval_ms);
        if now.saturating_sub(self.last_update) >= interval {
            self.last_update = now;
            self.request_status()?;
        }
        Ok(())
    }

    fn dump_config(&self) {
        info!("TIN bus device controller:");
        info!("  Update interval: {} ms", self.config.update_interval_ms);
        info!("  Receive buffer: {} bytes", self.config.rx_capacity);
        info!(
            "  Parity validation: {}",
            if self.config.validate_parity { "enabled" } else { "disabled" }
        );
        for name in self.sinks.configured() {
            info!("  Sink {name}: enabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tinbus::serial_mock::MockSerialPort;
    use crate::util::clock::MockClock;

    fn controller() -> (DeviceController<MockSerialPort, MockClock>, MockSerialPort) {
        let port = MockSerialPort::new();
        let device = DeviceController::new(port.clone(), MockClock::new(), DeviceConfig::default());
        (device, port)
    }

    #[test]
    fn test_send_command_reports_rejection() {
        let (mut device, port) = controller();
        assert!(!device.send_command(Command::SetWaterTemperature(75.0)).unwrap());
        assert!(port.get_tx_data().is_empty());
        assert!(device.send_command(Command::SetWaterTemperature(55.0)).unwrap());
        assert!(!port.get_tx_data().is_empty());
    }

    #[test]
    fn test_short_frame_ignored() {
        let (mut device, _port) = controller();
        let air = crate::sinks::Recorder::<f32>::new();
        device.sinks_mut().air_temperature = Some(Box::new(air.clone()));
        device.on_frame_ready(&[0x55, 0x56, 0xBB]);
        assert!(air.is_empty());
    }

    #[test]
    fn test_write_error_propagates() {
        let (mut device, port) = controller();
        port.set_next_error(std::io::Error::new(std::io::ErrorKind::Other, "gone"));
        assert!(matches!(
            device.set_vent_speed(2),
            Err(TinBusError::SerialPortError(_))
        ));
    }
}
