//! # Utility Modules
//!
//! Common helpers used throughout the tin-bus crate: hex formatting for bus
//! captures, time sources, and log rate limiting.

pub mod clock;
pub mod hex;
pub mod throttle;

pub use clock::{Clock, MockClock, SystemClock};
pub use hex::{decode_hex, format_hex_capped, HexError};
pub use throttle::LogThrottle;
