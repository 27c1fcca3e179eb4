//! Time-ordered 128-bit identifiers (UUIDv7).
//!
//! Layout: the most significant 48 bits carry the Unix millisecond
//! timestamp, the version nibble is 7, the variant bits follow RFC 4122,
//! and the remainder comes from a cryptographic random source. Because
//! the timestamp leads, identifiers issued in strict timestamp order
//! compare lexicographically in that same order.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Errors from parsing an identifier string.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    /// The string is not 32 hex digits in the 8-4-4-4-12 grouping.
    #[error("invalid identifier format")]
    InvalidFormat,
}

/// Generates a UUIDv7 in the five-group hyphenated hex form
/// (`8-4-4-4-12`, lowercase).
pub fn generate() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut bytes = [0u8; 16];
    // 48-bit big-endian millisecond timestamp at the most significant end.
    bytes[0] = (millis >> 40) as u8;
    bytes[1] = (millis >> 32) as u8;
    bytes[2] = (millis >> 24) as u8;
    bytes[3] = (millis >> 16) as u8;
    bytes[4] = (millis >> 8) as u8;
    bytes[5] = millis as u8;

    OsRng.fill_bytes(&mut bytes[6..]);

    // Version 7 nibble and RFC 4122 variant bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x70;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    format_groups(&bytes)
}

/// Extracts the millisecond timestamp from an identifier produced by
/// [`generate`].
pub fn parse_timestamp(id: &str) -> Result<u64, IdError> {
    let hex: String = id.chars().filter(|c| *c != '-').collect();
    if hex.len() != 32 || !is_grouped(id) {
        return Err(IdError::InvalidFormat);
    }
    u64::from_str_radix(&hex[..12], 16).map_err(|_| IdError::InvalidFormat)
}

fn is_grouped(id: &str) -> bool {
    let groups: Vec<&str> = id.split('-').collect();
    groups.len() == 5
        && [8, 4, 4, 4, 12]
            .iter()
            .zip(&groups)
            .all(|(len, group)| group.len() == *len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

fn format_groups(bytes: &[u8; 16]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
