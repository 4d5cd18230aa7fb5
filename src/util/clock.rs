//! # Time Sources
//!
//! Every timing decision in the crate (idle timeouts, settle deadlines, status
//! poll cadence, transmit pauses) goes through the [`Clock`] trait so that the
//! same state machines run against the wall clock in production and against a
//! manually advanced [`MockClock`] in tests.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Block for `duration`. Only used for the short pauses of the transmit sequence.
    fn delay(&self, duration: Duration);
}

/// Clock backed by `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn delay(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Manually advanced clock for tests.
///
/// Clones share the same time, so a test can keep one handle while the
/// component under test owns another. `delay` advances the shared time.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    /// Move time forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to an absolute time.
    pub fn set(&self, at: Duration) {
        *self.now.lock().unwrap() = at;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn delay(&self, duration: Duration) {
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_shared() {
        let clock = MockClock::new();
        let handle = clock.clone();
        handle.advance_ms(150);
        assert_eq!(clock.now(), Duration::from_millis(150));
        clock.delay(Duration::from_micros(100));
        assert_eq!(handle.now(), Duration::from_micros(150_100));
        handle.set(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_system_clock_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
