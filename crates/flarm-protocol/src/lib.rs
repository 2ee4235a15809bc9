//! FLARM NMEA Protocol Library
//!
//! This crate provides framing, parsing and encoding for the NMEA sentences
//! spoken on a FLARM data port:
//!
//! - **PFLAU**: operating status and the priority intruder
//! - **PFLAA**: relative geometry of every proximate aircraft
//! - **GPRMC** / **GPGGA**: own-ship position, encoding only
//!
//! # Architecture
//!
//! Received bytes flow through [`NmeaCodec`], which yields complete lines.
//! Each line is tokenized into a [`Sentence`]; typed sentences are then
//! parsed from it through [`ParseSentence`]. Parsing never indexes raw
//! fields directly, so malformed input becomes a [`ParseError`] rather
//! than a panic. Outgoing sentences implement [`EncodeSentence`], which
//! appends the XOR checksum and CRLF.
//!
//! # Example
//!
//! ```rust
//! use flarm_protocol::{NmeaCodec, ParseSentence, Pflaa, Sentence};
//!
//! let mut codec = NmeaCodec::new();
//! codec.push_bytes(b"$PFLAA,0,-10687,-22561,-10283,1,A4F2EE,136,0,269,0.0,0*4E\r\n");
//!
//! let line = codec.next_line().unwrap();
//! let sentence = Sentence::parse(&line).unwrap();
//! let pflaa = Pflaa::parse(&sentence).unwrap();
//! assert_eq!(pflaa.id.address, 0xA4F2EE);
//! ```

pub mod aircraft;
pub mod codec;
pub mod error;
pub mod gps;
pub mod id;
pub mod pflaa;
pub mod pflau;
pub mod sentence;

pub use aircraft::AircraftType;
pub use codec::NmeaCodec;
pub use error::ParseError;
pub use gps::{FixMode, FixStatus, Gpgga, Gprmc, Position};
pub use id::FlarmId;
pub use pflaa::{Pflaa, ID_TYPE_ANONYMOUS, ID_TYPE_FLARM, ID_TYPE_ICAO};
pub use pflau::{GpsFix, Pflau, ALARM_TYPE_AIRCRAFT};
pub use sentence::{checksum, frame, verify_checksum, Sentence};

/// Trait for sentences that can be parsed from a tokenized line
pub trait ParseSentence: Sized {
    /// Talker/sentence identifier this parser accepts
    const TALKER: &'static str;

    /// Minimum number of fields, talker included
    const MIN_FIELDS: usize;

    /// Parse from a tokenized sentence
    fn parse(sentence: &Sentence) -> Result<Self, ParseError>;
}

/// Trait for sentences that can be encoded to their wire format
pub trait EncodeSentence {
    /// Comma-separated body without `$`, checksum or terminator
    fn body(&self) -> String;

    /// Full wire form: `$<body>*HH\r\n`
    fn encode(&self) -> String {
        frame(&self.body())
    }
}
