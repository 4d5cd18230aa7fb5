//! # Bus Bridge
//!
//! Sits between the control panel and the heater, each on its own bus segment,
//! and forwards traffic in both directions. Frames are written to the opposite
//! segment byte for byte; the bridge never re-encodes, rejects or alters them.
//!
//! Each direction owns its own passthrough [`FrameAssembler`], so frame
//! boundaries and idle timing are tracked independently per side. With
//! diagnostics enabled every forwarded frame is also decoded for the log:
//!
//! ```text
//! [1520] Panel->Heater: Frame 0x03 (Air Heater Command), 5 bytes, ... | 55 83 82 0B 8D
//! ```

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::component::BusComponent;
use crate::config::BridgeConfig;
use crate::error::TinBusError;
use crate::sinks::TextSink;
use crate::tinbus::assembler::{AssemblerEvent, FrameAssembler, TimeoutPolicy};
use crate::tinbus::codec::diagnose_frame;
use crate::tinbus::serial::ChannelIo;
use crate::util::clock::Clock;
use crate::util::hex::format_hex_capped;
use crate::util::throttle::LogThrottle;

/// Traffic direction, named by source and destination segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    PanelToHeater = 0,
    HeaterToPanel = 1,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::PanelToHeater, Direction::HeaterToPanel];

    /// Index of the source segment, also the index of this direction's state.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::PanelToHeater => Direction::HeaterToPanel,
            Direction::HeaterToPanel => Direction::PanelToHeater,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::PanelToHeater => "Panel->Heater",
            Direction::HeaterToPanel => "Heater->Panel",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-direction forwarding counters. Only the bridge mutates them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    forwarded: [u64; 2],
    partial_flushes: [u64; 2],
    forwarded_bytes: [u64; 2],
}

impl BridgeStats {
    /// Frames and partial buffers forwarded in `direction`.
    pub fn forwarded(&self, direction: Direction) -> u64 {
        self.forwarded[direction.index()]
    }

    /// Partial buffers forwarded on idle timeout or overflow in `direction`.
    pub fn partial_flushes(&self, direction: Direction) -> u64 {
        self.partial_flushes[direction.index()]
    }

    pub fn forwarded_bytes(&self, direction: Direction) -> u64 {
        self.forwarded_bytes[direction.index()]
    }

    pub fn total_forwarded(&self) -> u64 {
        self.forwarded.iter().sum()
    }

    fn record(&mut self, direction: Direction, event: &AssemblerEvent) {
        let i = direction.index();
        self.forwarded[i] += 1;
        self.forwarded_bytes[i] += event.bytes().len() as u64;
        if matches!(event, AssemblerEvent::PartialFlushed(_)) {
            self.partial_flushes[i] += 1;
        }
    }
}

/// Bidirectional forwarder between a panel segment and a heater segment.
pub struct BusBridge<P: ChannelIo, C: Clock> {
    /// Indexed by [`Direction::index`] of the direction they are the source of.
    channels: [P; 2],
    assemblers: [FrameAssembler; 2],
    clock: C,
    config: BridgeConfig,
    stats: BridgeStats,
    text_sink: Option<Box<dyn TextSink>>,
    partial_throttle: LogThrottle,
}

impl<P: ChannelIo, C: Clock> BusBridge<P, C> {
    pub fn new(panel: P, heater: P, clock: C, config: BridgeConfig) -> Self {
        let assembler = || {
            FrameAssembler::new(
                config.rx_capacity,
                TimeoutPolicy::Passthrough,
                Duration::from_millis(config.idle_timeout_ms),
                Some(Duration::from_micros(config.settle_us)),
            )
        };
        let assemblers = [assembler(), assembler()];
        BusBridge {
            channels: [panel, heater],
            assemblers,
            clock,
            config,
            stats: BridgeStats::default(),
            text_sink: None,
            partial_throttle: LogThrottle::default(),
        }
    }

    /// Receives one formatted line per forwarded frame when diagnostics are on.
    pub fn with_text_sink(mut self, sink: Box<dyn TextSink>) -> Self {
        self.text_sink = Some(sink);
        self
    }

    pub fn set_text_sink(&mut self, sink: Option<Box<dyn TextSink>>) {
        self.text_sink = sink;
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn stats(&self) -> &BridgeStats {
        &self.stats
    }

    pub fn assembler(&self, direction: Direction) -> &FrameAssembler {
        &self.assemblers[direction.index()]
    }

    /// Drains one direction's source channel and forwards whatever the
    /// assembler reports, including a settle or idle flush with no new byte.
    pub fn service(&mut self, direction: Direction) -> Result<(), TinBusError> {
        let now = self.clock.now();
        let i = direction.index();
        let mut events = Vec::new();

        let source = &mut self.channels[i];
        let assembler = &mut self.assemblers[i];
        while source.available() > 0 {
            let Some(byte) = source.read() else {
                break;
            };
            assembler.push(byte, now, |ev| events.push(ev));
        }
        assembler.poll(now, |ev| events.push(ev));

        for event in events {
            self.forward(direction, &event, now)?;
        }
        Ok(())
    }

    fn forward(
        &mut self,
        direction: Direction,
        event: &AssemblerEvent,
        now: Duration,
    ) -> Result<(), TinBusError> {
        let bytes = event.bytes();
        let target = &mut self.channels[direction.opposite().index()];
        target.write_all(bytes)?;
        target.flush()?;
        self.stats.record(direction, event);

        if !self.config.logging_enabled {
            return Ok(());
        }

        let line = format!(
            "[{}] {}: {} | {}",
            now.as_millis(),
            direction,
            diagnose_frame(bytes),
            format_hex_capped(bytes, self.config.hex_cap)
        );
        match event {
            AssemblerEvent::FrameReady(_) => debug!("{line}"),
            AssemblerEvent::PartialFlushed(_) => {
                if self.partial_throttle.allow(now) {
                    warn!("Partial frame forwarded: {line}");
                }
            }
        }
        if let Some(sink) = self.text_sink.as_mut() {
            sink.publish(&line);
        }
        Ok(())
    }
}

impl<P: ChannelIo, C: Clock> BusComponent for BusBridge<P, C> {
    fn setup(&mut self) {
        info!("Setting up TIN bus bridge...");
        for assembler in &mut self.assemblers {
            assembler.reset();
        }
    }

    fn tick(&mut self) -> Result<(), TinBusError> {
        if !self.config.proxy_mode {
            return Ok(());
        }
        for direction in Direction::ALL {
            self.service(direction)?;
        }
        Ok(())
    }

    fn dump_config(&self) {
        info!("TIN bus bridge:");
        info!(
            "  Proxy mode: {}",
            if self.config.proxy_mode { "enabled" } else { "disabled" }
        );
        info!(
            "  Frame logging: {}",
            if self.config.logging_enabled { "enabled" } else { "disabled" }
        );
        info!(
            "  Receive buffer: {} bytes, idle timeout {} ms, settle {} us",
            self.config.rx_capacity, self.config.idle_timeout_ms, self.config.settle_us
        );
        info!("  Text sink: {}", if self.text_sink.is_some() { "configured" } else { "none" });
        for direction in Direction::ALL {
            info!(
                "  {}: {} forwarded, {} partial",
                direction,
                self.stats.forwarded(direction),
                self.stats.partial_flushes(direction)
            );
        }
    }
}
