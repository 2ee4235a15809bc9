//! Error types for traffic decoding

use flarm_protocol::ParseError;
use thiserror::Error;

/// Why an inbound sentence could not be turned into a traffic report
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// Sentence is malformed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// PFLAU without bearing, vertical, distance and ID of a target
    #[error("PFLAU carries no target geometry")]
    NoTarget,
}
