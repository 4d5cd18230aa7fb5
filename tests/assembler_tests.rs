//! Tests for the `tinbus::assembler` module: frame dispatch, overflow and idle-timeout policies.

use std::time::Duration;

use tin_bus::tinbus::assembler::{AssemblerEvent, FrameAssembler, TimeoutPolicy};

const INFO: [u8; 10] = [0x55, 0x56, 0xBB, 0x0B, 0xD3, 0x0C, 0x00, 0x01, 0x00, 0x03];

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn feed(asm: &mut FrameAssembler, bytes: &[u8], now: Duration) -> Vec<AssemblerEvent> {
    let mut events = Vec::new();
    for b in bytes {
        asm.push(*b, now, |e| events.push(e));
    }
    events
}

fn poll(asm: &mut FrameAssembler, now: Duration) -> Vec<AssemblerEvent> {
    let mut events = Vec::new();
    asm.poll(now, |e| events.push(e));
    events
}

/// Tests that a 10-byte info frame yields exactly one event and resets the cursor.
#[test]
fn test_info_frame_single_event() {
    for mut asm in [FrameAssembler::strict(32), FrameAssembler::passthrough(256)] {
        let events = feed(&mut asm, &INFO, ms(0));
        assert_eq!(events, vec![AssemblerEvent::FrameReady(INFO.to_vec())]);
        assert_eq!(asm.len(), 0);
        assert!(!asm.is_awaiting_remainder());
    }
}

/// Tests that a trailing checksum byte starts a new, unsynced buffer.
#[test]
fn test_checksum_after_info_is_pending() {
    let mut asm = FrameAssembler::strict(32);
    let mut bytes = INFO.to_vec();
    bytes.push(0xA9);
    let events = feed(&mut asm, &bytes, ms(0));
    assert_eq!(events.len(), 1);
    assert_eq!(asm.pending(), &[0xA9]);
}

/// Tests that strict overflow resets without panicking and drops the overflowing byte.
#[test]
fn test_strict_overflow() {
    let mut asm = FrameAssembler::strict(16);
    let events = feed(&mut asm, &[0x11; 40], ms(0));
    assert!(events.is_empty());
    assert_eq!(asm.overflows(), 2);
    assert_eq!(asm.len(), 6);
}

/// Tests that a synced non-info frame reaching capacity is discarded in strict mode.
#[test]
fn test_strict_overflow_of_synced_frame() {
    let mut asm = FrameAssembler::strict(12);
    let mut bytes = vec![0x55, 0x83];
    bytes.extend_from_slice(&[0x01; 10]);
    let events = feed(&mut asm, &bytes, ms(0));
    assert!(events.is_empty());
    assert_eq!(asm.overflows(), 1);
    assert!(asm.is_empty());
}

/// Tests that passthrough overflow forwards the full buffer and keeps every byte.
#[test]
fn test_passthrough_overflow_keeps_bytes() {
    let mut asm = FrameAssembler::passthrough(16);
    let events = feed(&mut asm, &[0x11; 20], ms(0));
    assert_eq!(events, vec![AssemblerEvent::PartialFlushed(vec![0x11; 16])]);
    assert_eq!(asm.len(), 4);
}

/// Tests that strict mode drops a partial frame silently after the idle threshold.
#[test]
fn test_strict_idle_discard() {
    let mut asm = FrameAssembler::strict(32);
    assert!(feed(&mut asm, &INFO[..5], ms(0)).is_empty());

    assert!(poll(&mut asm, ms(100)).is_empty());
    assert_eq!(asm.len(), 5);

    assert!(poll(&mut asm, ms(101)).is_empty());
    assert!(asm.is_empty());
}

/// Tests that passthrough mode forwards a partial frame exactly once after the idle threshold.
#[test]
fn test_passthrough_idle_flush() {
    let mut asm = FrameAssembler::passthrough(256);
    assert!(feed(&mut asm, &[0x00, 0x12, 0x34], ms(0)).is_empty());

    assert!(poll(&mut asm, ms(200)).is_empty());
    assert_eq!(
        poll(&mut asm, ms(201)),
        vec![AssemblerEvent::PartialFlushed(vec![0x00, 0x12, 0x34])]
    );
    assert!(poll(&mut asm, ms(500)).is_empty());
}

/// Tests that a frame following a quiet line is dispatched whole in strict mode.
#[test]
fn test_strict_frame_after_quiet_line() {
    let mut asm = FrameAssembler::strict(32);
    assert_eq!(feed(&mut asm, &INFO, ms(0)).len(), 1);
    assert!(poll(&mut asm, ms(2_500)).is_empty());

    let events = feed(&mut asm, &INFO, ms(5_000));
    assert_eq!(events, vec![AssemblerEvent::FrameReady(INFO.to_vec())]);
    assert!(asm.is_empty());
}

/// Tests that stale bytes are dropped before the next frame starts in strict mode,
/// even when no poll ran in between.
#[test]
fn test_strict_stale_bytes_dropped_before_frame() {
    let mut asm = FrameAssembler::strict(32);
    feed(&mut asm, &INFO[..4], ms(0));

    let events = feed(&mut asm, &INFO, ms(500));
    assert_eq!(events, vec![AssemblerEvent::FrameReady(INFO.to_vec())]);
}

/// Tests that repeated command frames separated by idle time each yield one frame event.
#[test]
fn test_passthrough_frames_after_quiet_line() {
    let mut asm = FrameAssembler::passthrough(256);
    let cmd = [0x55, 0x83, 0x82, 0x0B, 0x8D];

    assert!(feed(&mut asm, &cmd, ms(0)).is_empty());
    assert_eq!(poll(&mut asm, ms(1)), vec![AssemblerEvent::FrameReady(cmd.to_vec())]);
    assert!(poll(&mut asm, ms(500)).is_empty());

    assert!(feed(&mut asm, &cmd, ms(1_000)).is_empty());
    assert_eq!(asm.pending(), &cmd);
    assert_eq!(
        poll(&mut asm, ms(1_001)),
        vec![AssemblerEvent::FrameReady(cmd.to_vec())]
    );
}

/// Tests that a pending frame settles when the next frame starts without an intermediate poll.
#[test]
fn test_passthrough_back_to_back_frames_without_poll() {
    let mut asm = FrameAssembler::passthrough(256);
    let cmd = [0x55, 0xC7, 0x03, 0x03];

    feed(&mut asm, &cmd, ms(0));
    let events = feed(&mut asm, &cmd, ms(1_000));
    assert_eq!(events, vec![AssemblerEvent::FrameReady(cmd.to_vec())]);
    assert_eq!(asm.pending(), &cmd);
}

/// Tests that stale unsynced bytes are flushed on their own before a new frame.
#[test]
fn test_passthrough_stale_bytes_flushed_before_frame() {
    let mut asm = FrameAssembler::passthrough(256);
    feed(&mut asm, &[0x00, 0x12], ms(0));

    let events = feed(&mut asm, &INFO, ms(300));
    assert_eq!(
        events,
        vec![
            AssemblerEvent::PartialFlushed(vec![0x00, 0x12]),
            AssemblerEvent::FrameReady(INFO.to_vec()),
        ]
    );
}

/// Tests that the first byte ever received is never treated as idle.
#[test]
fn test_first_byte_not_idle() {
    let mut asm = FrameAssembler::strict(32);
    feed(&mut asm, &[0x55], ms(10_000));
    assert_eq!(asm.len(), 1);
}

/// Tests that a non-info frame is dispatched once the line settles in passthrough mode.
#[test]
fn test_passthrough_settle_dispatch() {
    let mut asm = FrameAssembler::new(
        64,
        TimeoutPolicy::Passthrough,
        ms(200),
        Some(Duration::from_micros(500)),
    );
    let cmd = [0x55, 0xC7, 0x03, 0x03];
    assert!(feed(&mut asm, &cmd, ms(0)).is_empty());
    assert!(asm.is_awaiting_remainder());
    assert_eq!(
        poll(&mut asm, ms(1)),
        vec![AssemblerEvent::FrameReady(cmd.to_vec())]
    );
    assert_eq!(asm.policy(), TimeoutPolicy::Passthrough);
}

/// Tests that reset drops everything.
#[test]
fn test_reset() {
    let mut asm = FrameAssembler::passthrough(256);
    feed(&mut asm, &[0x55, 0x83, 0x82], ms(0));
    asm.reset();
    assert!(asm.is_empty());
    assert!(!asm.is_awaiting_remainder());
    assert!(poll(&mut asm, ms(1_000)).is_empty());
}
