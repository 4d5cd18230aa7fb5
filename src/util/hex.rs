//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for bus sniffing output and for feeding captured frames
//! back into the decoder from the command line.
//!
//! ## Usage
//!
//! ```rust
//! use tin_bus::util::hex::{decode_hex, format_hex_capped};
//!
//! let data = decode_hex("55 83 82 0B 8D").unwrap();
//! assert_eq!(format_hex_capped(&data, 32), "55 83 82 0B 8D");
//! assert_eq!(format_hex_capped(&data, 2), "55 83 ...");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters. Whitespace, `:` and `-`
/// separators are stripped, so bus captures like `55 83 82` or `55:83:82` decode
/// directly.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format bytes as space separated upper-case hex, rendering at most `cap` bytes.
///
/// Output that was cut short ends in `...`.
pub fn format_hex_capped(data: &[u8], cap: usize) -> String {
    let shown = &data[..data.len().min(cap)];
    let mut out = shown
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ");

    if data.len() > cap {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str("...");
    }
    out
}
