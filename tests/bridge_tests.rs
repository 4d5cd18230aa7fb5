//! Tests for the `BusBridge`: verbatim forwarding, per-direction counters and diagnostic output.

use tin_bus::config::BridgeConfig;
use tin_bus::sinks::Recorder;
use tin_bus::tinbus::serial_mock::MockSerialPort;
use tin_bus::{BusBridge, BusComponent, Direction, MockClock};

const INFO_WITH_CHECKSUM: [u8; 11] = [
    0x55, 0x56, 0xBB, 0x0B, 0xD3, 0x0C, 0x00, 0x01, 0x00, 0x03, 0xA9,
];

struct Harness {
    bridge: BusBridge<MockSerialPort, MockClock>,
    panel: MockSerialPort,
    heater: MockSerialPort,
    clock: MockClock,
    lines: Recorder<String>,
}

fn harness(config: BridgeConfig) -> Harness {
    let panel = MockSerialPort::new();
    let heater = MockSerialPort::new();
    let clock = MockClock::new();
    let lines = Recorder::<String>::new();
    let mut bridge = BusBridge::new(panel.clone(), heater.clone(), clock.clone(), config)
        .with_text_sink(Box::new(lines.clone()));
    bridge.setup();
    Harness {
        bridge,
        panel,
        heater,
        clock,
        lines,
    }
}

/// Tests that a complete command frame reaches the heater unchanged.
#[test]
fn test_command_forwarded_verbatim() {
    let mut h = harness(BridgeConfig::default());
    let frame = [0x55, 0x83, 0x82, 0x0B, 0x8D];

    h.panel.queue_rx_data(&frame);
    h.bridge.tick().unwrap();
    assert!(h.heater.get_tx_data().is_empty());

    h.clock.advance_ms(1);
    h.bridge.tick().unwrap();

    assert_eq!(h.heater.get_tx_data(), frame.to_vec());
    assert!(h.panel.get_tx_data().is_empty());
    let stats = h.bridge.stats();
    assert_eq!(stats.forwarded(Direction::PanelToHeater), 1);
    assert_eq!(stats.forwarded(Direction::HeaterToPanel), 0);
    assert_eq!(stats.partial_flushes(Direction::PanelToHeater), 0);
}

/// Tests that frames separated by a quiet line are each forwarded as one frame.
#[test]
fn test_frames_after_quiet_line() {
    let mut h = harness(BridgeConfig::default());
    let frame = [0x55, 0x83, 0x82, 0x0B, 0x8D];

    h.panel.queue_rx_data(&frame);
    h.bridge.tick().unwrap();
    h.clock.advance_ms(1);
    h.bridge.tick().unwrap();
    assert_eq!(h.heater.take_tx_data(), frame.to_vec());

    h.clock.advance_ms(1_000);
    h.bridge.tick().unwrap();
    h.panel.queue_rx_data(&frame);
    h.bridge.tick().unwrap();
    h.clock.advance_ms(1);
    h.bridge.tick().unwrap();

    assert_eq!(h.heater.take_tx_data(), frame.to_vec());
    let stats = h.bridge.stats();
    assert_eq!(stats.forwarded(Direction::PanelToHeater), 2);
    assert_eq!(stats.partial_flushes(Direction::PanelToHeater), 0);
    assert_eq!(h.lines.len(), 2);
}

/// Tests steady-state status traffic from the heater with idle gaps between replies.
#[test]
fn test_status_replies_after_quiet_line() {
    let mut h = harness(BridgeConfig::default());

    for _ in 0..3 {
        h.heater.queue_rx_data(&INFO_WITH_CHECKSUM);
        h.bridge.tick().unwrap();
        h.clock.advance_ms(5_000);
        h.bridge.tick().unwrap();
    }

    assert_eq!(h.panel.get_tx_data(), INFO_WITH_CHECKSUM.repeat(3));
    let stats = h.bridge.stats();
    assert_eq!(stats.forwarded(Direction::HeaterToPanel), 6);
    assert_eq!(stats.partial_flushes(Direction::HeaterToPanel), 3);
    let info_lines = h
        .lines
        .values()
        .iter()
        .filter(|l| l.contains("Info (Status)"))
        .count();
    assert_eq!(info_lines, 3);
}

/// Tests that an info frame and its checksum byte both reach the panel.
#[test]
fn test_info_frame_and_checksum_forwarded() {
    let mut h = harness(BridgeConfig::default());

    h.heater.queue_rx_data(&INFO_WITH_CHECKSUM);
    h.bridge.tick().unwrap();
    assert_eq!(h.panel.get_tx_data(), INFO_WITH_CHECKSUM[..10].to_vec());

    h.clock.advance_ms(201);
    h.bridge.tick().unwrap();

    assert_eq!(h.panel.get_tx_data(), INFO_WITH_CHECKSUM.to_vec());
    let stats = h.bridge.stats();
    assert_eq!(stats.forwarded(Direction::HeaterToPanel), 2);
    assert_eq!(stats.partial_flushes(Direction::HeaterToPanel), 1);
    assert_eq!(stats.forwarded_bytes(Direction::HeaterToPanel), 11);
    assert_eq!(stats.forwarded(Direction::PanelToHeater), 0);
}

/// Tests that the break byte and unknown frames pass through untouched.
#[test]
fn test_unsynced_bytes_forwarded_after_idle() {
    let mut h = harness(BridgeConfig::default());
    let raw = [0x00, 0x55, 0xAA, 0x01, 0x02];

    h.panel.queue_rx_data(&raw);
    h.bridge.tick().unwrap();
    h.clock.advance_ms(250);
    h.bridge.tick().unwrap();

    assert_eq!(h.heater.get_tx_data(), raw.to_vec());
    assert_eq!(h.bridge.stats().partial_flushes(Direction::PanelToHeater), 1);
}

/// Tests that the two directions keep separate state.
#[test]
fn test_directions_are_independent() {
    let mut h = harness(BridgeConfig::default());

    h.panel.queue_rx_data(&[0x55, 0xC7, 0x03]);
    h.heater.queue_rx_data(&INFO_WITH_CHECKSUM[..10]);
    h.bridge.tick().unwrap();

    assert_eq!(h.panel.get_tx_data(), INFO_WITH_CHECKSUM[..10].to_vec());
    assert!(h.heater.get_tx_data().is_empty());
    assert!(h.bridge.assembler(Direction::PanelToHeater).is_awaiting_remainder());
    assert!(h.bridge.assembler(Direction::HeaterToPanel).is_empty());

    h.panel.queue_rx_data(&[0x03]);
    h.bridge.tick().unwrap();
    h.clock.advance_ms(1);
    h.bridge.tick().unwrap();

    assert_eq!(h.heater.get_tx_data(), vec![0x55, 0xC7, 0x03, 0x03]);
    assert_eq!(h.bridge.stats().forwarded(Direction::PanelToHeater), 1);
    assert_eq!(h.bridge.stats().forwarded(Direction::HeaterToPanel), 1);
}

/// Tests that nothing is read or forwarded with proxy mode disabled.
#[test]
fn test_proxy_mode_disabled() {
    let mut h = harness(BridgeConfig {
        proxy_mode: false,
        ..BridgeConfig::default()
    });

    h.panel.queue_rx_data(&[0x55, 0x83, 0x82, 0x0B, 0x8D]);
    h.bridge.tick().unwrap();
    h.clock.advance_ms(500);
    h.bridge.tick().unwrap();

    assert!(h.heater.get_tx_data().is_empty());
    assert_eq!(h.panel.rx_pending(), 5);
    assert_eq!(h.bridge.stats().total_forwarded(), 0);
}

/// Tests the text line published for a forwarded frame.
#[test]
fn test_text_sink_line() {
    let mut h = harness(BridgeConfig::default());

    h.clock.advance_ms(1_500);
    h.heater.queue_rx_data(&INFO_WITH_CHECKSUM[..10]);
    h.bridge.tick().unwrap();

    let line = h.lines.last().unwrap();
    assert!(line.starts_with("[1500] Heater->Panel: Frame 0x16 (Info (Status)), 10 bytes, air "));
    assert!(line.ends_with("| 55 56 BB 0B D3 0C 00 01 00 03"));
}

/// Tests that long captures are cut at the hex cap.
#[test]
fn test_text_sink_hex_cap() {
    let mut h = harness(BridgeConfig {
        hex_cap: 4,
        ..BridgeConfig::default()
    });

    h.panel.queue_rx_data(&[0x11; 8]);
    h.bridge.tick().unwrap();
    h.clock.advance_ms(201);
    h.bridge.tick().unwrap();

    assert_eq!(h.lines.values(), vec!["[201] Panel->Heater: Unsynced, 8 bytes | 11 11 11 11 ...".to_string()]);
    assert_eq!(h.heater.get_tx_data(), vec![0x11; 8]);
}

/// Tests that forwarding still happens with diagnostics disabled, without text output.
#[test]
fn test_logging_disabled() {
    let mut h = harness(BridgeConfig {
        logging_enabled: false,
        ..BridgeConfig::default()
    });

    h.heater.queue_rx_data(&INFO_WITH_CHECKSUM[..10]);
    h.bridge.tick().unwrap();

    assert_eq!(h.panel.get_tx_data().len(), 10);
    assert!(h.lines.is_empty());
}

/// Tests that a failing target channel surfaces as an error from the tick.
#[test]
fn test_write_error_propagates() {
    let mut h = harness(BridgeConfig::default());
    h.panel.set_next_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged"));

    h.heater.queue_rx_data(&INFO_WITH_CHECKSUM[..10]);
    assert!(h.bridge.tick().is_err());
    assert_eq!(h.bridge.stats().forwarded(Direction::HeaterToPanel), 0);
}
