//! `PFLAA` - data on other proximate aircraft
//!
//! ```text
//! $PFLAA,<AlarmLevel>,<RelativeNorth>,<RelativeEast>,<RelativeVertical>,
//!        <IDType>,<ID>,<Track>,<TurnRate>,<GroundSpeed>,<ClimbRate>,<AcftType>*HH
//! ```
//!
//! For targets without a known bearing, `<RelativeNorth>` carries the
//! estimated distance and `<RelativeEast>` is empty, as are track, turn
//! rate and ground speed.

use crate::aircraft::AircraftType;
use crate::error::ParseError;
use crate::id::FlarmId;
use crate::sentence::{lenient_f64, lenient_i32, Sentence};
use crate::{EncodeSentence, ParseSentence};

/// ID type: official ICAO 24-bit address
pub const ID_TYPE_ICAO: u8 = 1;
/// ID type: stable FLARM ID chosen by the device
pub const ID_TYPE_FLARM: u8 = 2;
/// ID type: anonymous (stealth) ID
pub const ID_TYPE_ANONYMOUS: u8 = 3;

/// Parsed or to-be-encoded `PFLAA` sentence
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pflaa {
    /// Alarm level 0-3
    pub alarm_level: u8,
    /// Meters north of own position, or distance for bearingless targets
    pub relative_north: Option<i32>,
    /// Meters east of own position; empty for bearingless targets
    pub relative_east: Option<i32>,
    /// Meters above own altitude
    pub relative_vertical: Option<i32>,
    /// 0-3, see `ID_TYPE_*`
    pub id_type: u8,
    /// Target identifier
    pub id: FlarmId,
    /// True ground track, degrees
    pub track: Option<f64>,
    /// Turn rate, degrees per second
    pub turn_rate: Option<f64>,
    /// Ground speed, m/s
    pub ground_speed: Option<f64>,
    /// Climb rate, m/s, positive when climbing
    pub climb_rate: Option<f64>,
    /// Aircraft type
    pub aircraft_type: AircraftType,
}

impl Pflaa {
    /// True when the target carries no bearing (`<RelativeEast>` empty)
    pub fn is_bearingless(&self) -> bool {
        self.relative_east.is_none()
    }
}

impl ParseSentence for Pflaa {
    const TALKER: &'static str = "PFLAA";
    const MIN_FIELDS: usize = 12;

    fn parse(sentence: &Sentence) -> Result<Self, ParseError> {
        sentence.expect_talker(Self::TALKER)?;
        sentence.require_len(Self::MIN_FIELDS)?;

        let id = FlarmId::parse(sentence.required(6)?)?;

        Ok(Self {
            alarm_level: lenient_i32(sentence.field_or_empty(1)).clamp(0, 3) as u8,
            relative_north: sentence.optional(2).map(lenient_i32),
            relative_east: sentence.optional(3).map(lenient_i32),
            relative_vertical: sentence.optional(4).map(lenient_i32),
            id_type: lenient_i32(sentence.field_or_empty(5)).clamp(0, 0xFF) as u8,
            id,
            track: sentence.optional(7).map(lenient_f64),
            turn_rate: sentence.optional(8).map(lenient_f64),
            ground_speed: sentence.optional(9).map(lenient_f64),
            climb_rate: sentence.optional(10).map(lenient_f64),
            aircraft_type: AircraftType::from_code(sentence.field_or_empty(11)),
        })
    }
}

impl EncodeSentence for Pflaa {
    fn body(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            Self::TALKER,
            self.alarm_level,
            opt_meters(self.relative_north),
            opt_meters(self.relative_east),
            opt_meters(self.relative_vertical),
            self.id_type,
            self.id,
            opt_fixed(self.track, 0),
            opt_fixed(self.turn_rate, 0),
            opt_fixed(self.ground_speed, 0),
            opt_fixed(self.climb_rate, 1),
            self.aircraft_type.code(),
        )
    }
}

/// Relative distances are 16-bit signed on the wire
fn opt_meters(value: Option<i32>) -> String {
    value
        .map(|v| v.clamp(i16::MIN as i32, i16::MAX as i32).to_string())
        .unwrap_or_default()
}

fn opt_fixed(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_default()
}
