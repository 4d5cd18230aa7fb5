//! # Log Throttling
//!
//! A noisy bus segment (baud mismatch, a babbling node) can overflow the
//! receive buffers hundreds of times per second. `LogThrottle` caps how many
//! of those warnings make it into the log per time window.
//!
//! ```rust
//! use std::time::Duration;
//! use tin_bus::util::throttle::LogThrottle;
//!
//! let mut throttle = LogThrottle::new(Duration::from_secs(1), 2);
//! let now = Duration::ZERO;
//! assert!(throttle.allow(now));
//! assert!(throttle.allow(now));
//! assert!(!throttle.allow(now));
//! assert!(throttle.allow(now + Duration::from_millis(1001)));
//! ```

use std::time::Duration;

/// Rate limiter for repetitive log messages.
///
/// Time is supplied by the caller, so the throttle follows whatever clock the
/// owning component runs on.
#[derive(Debug, Clone)]
pub struct LogThrottle {
    window: Duration,
    cap: u32,
    count: u32,
    suppressed: u64,
    window_start: Option<Duration>,
}

impl LogThrottle {
    /// Allow at most `cap` messages per `window`.
    pub fn new(window: Duration, cap: u32) -> Self {
        Self {
            window,
            cap,
            count: 0,
            suppressed: 0,
            window_start: None,
        }
    }

    /// Returns `true` if a message may be logged at `now`.
    pub fn allow(&mut self, now: Duration) -> bool {
        let expired = match self.window_start {
            Some(start) => now.saturating_sub(start) > self.window,
            None => true,
        };
        if expired {
            self.window_start = Some(now);
            self.count = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Messages dropped since the throttle was created.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl Default for LogThrottle {
    /// Five messages per second.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 5)
    }
}
