//! # Frame Assembler
//!
//! Byte-stream reassembly for one receive direction. Bytes are pushed one at a
//! time together with the current time; the assembler reports complete frames
//! and, depending on its [`TimeoutPolicy`], forwards or drops partial buffers.
//!
//! Per byte the assembler:
//!
//! 1. applies the idle timeout to the bytes already buffered if the gap since
//!    the previous byte exceeds the threshold, so the new byte always starts a
//!    fresh buffer after a quiet line,
//! 2. appends the byte (a full buffer is reset first),
//! 3. dispatches a frame once the buffer starts with the sync byte and the frame
//!    is known to be complete (info frames at 10 bytes),
//! 4. records the byte time.
//!
//! Only the info frame has a length the receiver can know. In passthrough mode
//! any other synced frame is considered complete once the line has been quiet
//! for the settle time ("awaiting remainder"). That deadline is re-checked on
//! the next byte or the next [`FrameAssembler::poll`], never by blocking.
//!
//! ```rust
//! use std::time::Duration;
//! use tin_bus::tinbus::assembler::{AssemblerEvent, FrameAssembler};
//!
//! let mut assembler = FrameAssembler::strict(32);
//! let frame = [0x55, 0x56, 0xBB, 0x0B, 0xD3, 0x0C, 0x00, 0x01, 0x00, 0x03];
//! let mut events = Vec::new();
//! for b in frame {
//!     assembler.push(b, Duration::ZERO, |ev| events.push(ev));
//! }
//! assert_eq!(events, vec![AssemblerEvent::FrameReady(frame.to_vec())]);
//! assert_eq!(assembler.len(), 0);
//! ```

use std::time::Duration;

use log::warn;

use crate::constants::{
    BRIDGE_IDLE_TIMEOUT_MS, BRIDGE_SETTLE_US, DEVICE_IDLE_TIMEOUT_MS, LIN_SYNC_BYTE,
    TIN_FRAME_INFO, TIN_INFO_FRAME_LEN,
};
use crate::tinbus::frame::decode_protected_id;
use crate::util::throttle::LogThrottle;

/// What happens to a partial buffer when the line goes idle or the buffer overflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Drop partial data silently (single-device receiver).
    StrictDiscard,
    /// Emit partial data as [`AssemblerEvent::PartialFlushed`] (bridge receiver).
    Passthrough,
}

/// Output of the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblerEvent {
    /// A frame starting with the sync byte, complete as far as the receiver can tell.
    FrameReady(Vec<u8>),
    /// Bytes flushed on idle timeout or overflow in passthrough mode.
    PartialFlushed(Vec<u8>),
}

impl AssemblerEvent {
    pub fn bytes(&self) -> &[u8] {
        match self {
            AssemblerEvent::FrameReady(b) | AssemblerEvent::PartialFlushed(b) => b,
        }
    }
}

/// Reassembly state for a single receive direction.
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    capacity: usize,
    policy: TimeoutPolicy,
    idle_timeout: Duration,
    settle: Option<Duration>,
    last_byte_time: Option<Duration>,
    settle_deadline: Option<Duration>,
    overflow_throttle: LogThrottle,
    overflows: u64,
}

impl FrameAssembler {
    /// Creates an assembler. `settle` enables the awaiting-remainder state and is
    /// only honoured under [`TimeoutPolicy::Passthrough`].
    pub fn new(
        capacity: usize,
        policy: TimeoutPolicy,
        idle_timeout: Duration,
        settle: Option<Duration>,
    ) -> Self {
        let settle = match policy {
            TimeoutPolicy::Passthrough => settle,
            TimeoutPolicy::StrictDiscard => None,
        };
        FrameAssembler {
            buffer: Vec::with_capacity(capacity),
            capacity: capacity.max(1),
            policy,
            idle_timeout,
            settle,
            last_byte_time: None,
            settle_deadline: None,
            overflow_throttle: LogThrottle::default(),
            overflows: 0,
        }
    }

    /// Strict-discard receiver with the 100 ms idle threshold.
    pub fn strict(capacity: usize) -> Self {
        Self::new(
            capacity,
            TimeoutPolicy::StrictDiscard,
            Duration::from_millis(DEVICE_IDLE_TIMEOUT_MS),
            None,
        )
    }

    /// Passthrough receiver with the 200 ms idle threshold and 500 us settle time.
    pub fn passthrough(capacity: usize) -> Self {
        Self::new(
            capacity,
            TimeoutPolicy::Passthrough,
            Duration::from_millis(BRIDGE_IDLE_TIMEOUT_MS),
            Some(Duration::from_micros(BRIDGE_SETTLE_US)),
        )
    }

    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered bytes (the write cursor).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Currently buffered bytes.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Whether a synced frame is waiting for its settle deadline.
    pub fn is_awaiting_remainder(&self) -> bool {
        self.settle_deadline.is_some()
    }

    /// Number of buffer overflows since creation.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    /// Processes one received byte.
    pub fn push<F>(&mut self, byte: u8, now: Duration, mut emit: F)
    where
        F: FnMut(AssemblerEvent),
    {
        self.flush_settled(now, &mut emit);
        if !self.buffer.is_empty() && self.is_idle(now) {
            self.expire(&mut emit);
        }

        if self.buffer.len() >= self.capacity {
            self.overflow(now, &mut emit);
            if self.policy == TimeoutPolicy::StrictDiscard {
                // the byte that hit the full buffer is lost with it
                self.last_byte_time = Some(now);
                return;
            }
        }
        self.buffer.push(byte);

        if self.buffer.len() >= 3 && self.buffer[0] == LIN_SYNC_BYTE {
            let id = decode_protected_id(self.buffer[1]);
            if id == TIN_FRAME_INFO && self.buffer.len() >= TIN_INFO_FRAME_LEN {
                self.dispatch(&mut emit);
            } else if self.buffer.len() >= self.capacity {
                self.overflow(now, &mut emit);
            } else if let Some(settle) = self.settle {
                self.settle_deadline = Some(now + settle);
            }
        }

        self.last_byte_time = Some(now);
    }

    /// Re-checks the settle deadline and the idle timeout without a new byte.
    ///
    /// Call once per tick after draining the channel.
    pub fn poll<F>(&mut self, now: Duration, mut emit: F)
    where
        F: FnMut(AssemblerEvent),
    {
        self.flush_settled(now, &mut emit);
        if !self.buffer.is_empty() && self.is_idle(now) {
            self.expire(&mut emit);
        }
    }

    /// Drops all buffered bytes and timing state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.settle_deadline = None;
        self.last_byte_time = None;
    }

    fn is_idle(&self, now: Duration) -> bool {
        match self.last_byte_time {
            Some(last) => now.saturating_sub(last) > self.idle_timeout,
            None => false,
        }
    }

    fn flush_settled<F>(&mut self, now: Duration, emit: &mut F)
    where
        F: FnMut(AssemblerEvent),
    {
        if let Some(deadline) = self.settle_deadline {
            if now >= deadline {
                self.dispatch(emit);
            }
        }
    }

    fn dispatch<F>(&mut self, emit: &mut F)
    where
        F: FnMut(AssemblerEvent),
    {
        let frame = std::mem::take(&mut self.buffer);
        self.buffer.reserve(self.capacity);
        self.settle_deadline = None;
        emit(AssemblerEvent::FrameReady(frame));
    }

    fn expire<F>(&mut self, emit: &mut F)
    where
        F: FnMut(AssemblerEvent),
    {
        self.settle_deadline = None;
        match self.policy {
            TimeoutPolicy::StrictDiscard => self.buffer.clear(),
            TimeoutPolicy::Passthrough => {
                let partial = std::mem::take(&mut self.buffer);
                self.buffer.reserve(self.capacity);
                emit(AssemblerEvent::PartialFlushed(partial));
            }
        }
    }

    fn overflow<F>(&mut self, now: Duration, emit: &mut F)
    where
        F: FnMut(AssemblerEvent),
    {
        self.overflows += 1;
        if self.overflow_throttle.allow(now) {
            warn!(
                "Receive buffer overflow after {} bytes, resetting ({:?})",
                self.buffer.len(),
                self.policy
            );
        }
        self.expire(emit);
    }
}
