//! Error types for NMEA sentence parsing

use thiserror::Error;

/// Errors that can occur while parsing an NMEA sentence
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line contained nothing but framing or whitespace
    #[error("empty sentence")]
    Empty,

    /// Sentence has fewer fields than its talker requires
    #[error("{talker}: expected at least {expected} fields, got {actual}")]
    TooFewFields {
        talker: String,
        expected: usize,
        actual: usize,
    },

    /// A field that must carry a value was empty
    #[error("{talker}: required field {index} is empty")]
    MissingField { talker: String, index: usize },

    /// Sentence was handed to the parser of a different talker
    #[error("unexpected talker: expected {expected}, got {actual}")]
    UnexpectedTalker {
        expected: &'static str,
        actual: String,
    },

    /// Device ID is not a hexadecimal address
    #[error("invalid device id: {0}")]
    InvalidId(String),

    /// Checksum mismatch
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },
}
