//! Protocol module
//!
//! Wire format of the OpenTibia status query:
//! - The fixed request probe written after connecting
//! - The XML reply parser ([`parser::parse_status`])
//!
//! The reply carries no length header; it ends when the server closes the
//! connection.

pub mod parser;

pub use parser::parse_status;

/// Status protocol identifier (first byte after the length prefix)
pub const STATUS_PROTOCOL_ID: u8 = 0xFF;

/// Request type asking for the XML status document
pub const STATUS_REQUEST_INFO: u8 = 0xFF;

/// Status request keyword
pub const STATUS_KEYWORD: &[u8; 4] = b"info";

/// Request probe, byte for byte:
///
/// | bytes | value | meaning |
/// |-------|-------|---------|
/// | 0-1   | `06 00` | payload length (u16, little-endian) |
/// | 2     | `FF` | status protocol id |
/// | 3     | `FF` | XML info request |
/// | 4-7   | `info` | keyword |
pub const STATUS_PROBE: [u8; 8] = [
    0x06,
    0x00,
    STATUS_PROTOCOL_ID,
    STATUS_REQUEST_INFO,
    STATUS_KEYWORD[0],
    STATUS_KEYWORD[1],
    STATUS_KEYWORD[2],
    STATUS_KEYWORD[3],
];
