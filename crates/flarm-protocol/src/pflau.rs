//! `PFLAU` - operating status and priority intruder
//!
//! ```text
//! $PFLAU,<RX>,<TX>,<GPS>,<Power>,<AlarmLevel>,<RelativeBearing>,<AlarmType>,
//!        <RelativeVertical>,<RelativeDistance>,<ID>*HH
//! ```
//!
//! Without an active alarm the bearing, vertical, distance and ID fields are
//! left empty: `$PFLAU,3,1,2,1,0,,0,,,*4F`.

use crate::error::ParseError;
use crate::id::FlarmId;
use crate::sentence::{lenient_i32, Sentence};
use crate::{EncodeSentence, ParseSentence};

/// Alarm type value for an aircraft alarm
pub const ALARM_TYPE_AIRCRAFT: u8 = 2;

/// GPS status field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GpsFix {
    /// 0 - no GPS reception
    #[default]
    None,
    /// 1 - 3D fix, on ground
    Ground,
    /// 2 - 3D fix, airborne
    Airborne,
}

impl GpsFix {
    fn value(&self) -> u8 {
        match self {
            GpsFix::None => 0,
            GpsFix::Ground => 1,
            GpsFix::Airborne => 2,
        }
    }

    fn from_value(v: i32) -> Self {
        match v {
            1 => GpsFix::Ground,
            2 => GpsFix::Airborne,
            _ => GpsFix::None,
        }
    }
}

/// Parsed or to-be-encoded `PFLAU` sentence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pflau {
    /// Number of devices with unique IDs currently received
    pub rx: u32,
    /// Transmission status
    pub tx: bool,
    /// GPS status
    pub gps: GpsFix,
    /// Power status
    pub power: bool,
    /// Alarm level 0-3
    pub alarm_level: u8,
    /// Bearing relative to own track, -180..180 degrees
    pub relative_bearing: Option<i32>,
    /// 0 = no aircraft alarm, 2 = aircraft alarm
    pub alarm_type: u8,
    /// Vertical separation in meters, positive when the target is above
    pub relative_vertical: Option<i32>,
    /// Horizontal distance in meters
    pub relative_distance: Option<u32>,
    /// Priority intruder
    pub id: Option<FlarmId>,
}

impl ParseSentence for Pflau {
    const TALKER: &'static str = "PFLAU";
    const MIN_FIELDS: usize = 11;

    fn parse(sentence: &Sentence) -> Result<Self, ParseError> {
        sentence.expect_talker(Self::TALKER)?;
        sentence.require_len(Self::MIN_FIELDS)?;

        let id = match sentence.optional(10) {
            Some(field) => Some(FlarmId::parse(field)?),
            None => None,
        };

        Ok(Self {
            rx: lenient_i32(sentence.field_or_empty(1)).max(0) as u32,
            tx: lenient_i32(sentence.field_or_empty(2)) != 0,
            gps: GpsFix::from_value(lenient_i32(sentence.field_or_empty(3))),
            power: lenient_i32(sentence.field_or_empty(4)) != 0,
            alarm_level: lenient_i32(sentence.field_or_empty(5)).clamp(0, 3) as u8,
            relative_bearing: sentence.optional(6).map(lenient_i32),
            alarm_type: lenient_i32(sentence.field_or_empty(7)).clamp(0, 0xFF) as u8,
            relative_vertical: sentence.optional(8).map(lenient_i32),
            relative_distance: sentence.optional(9).map(|f| lenient_i32(f).unsigned_abs()),
            id,
        })
    }
}

impl EncodeSentence for Pflau {
    fn body(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{}",
            Self::TALKER,
            self.rx,
            u8::from(self.tx),
            self.gps.value(),
            u8::from(self.power),
            self.alarm_level,
            opt(self.relative_bearing),
            self.alarm_type,
            opt(self.relative_vertical),
            opt(self.relative_distance),
            self.id.as_ref().map(ToString::to_string).unwrap_or_default(),
        )
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentence::verify_checksum;

    #[test]
    fn test_encode_no_alarm() {
        let pflau = Pflau {
            rx: 3,
            tx: true,
            gps: GpsFix::Airborne,
            power: true,
            ..Default::default()
        };
        assert_eq!(pflau.body(), "PFLAU,3,1,2,1,0,,0,,,");
        let framed = pflau.encode();
        assert!(framed.starts_with("$PFLAU,3,1,2,1,0,,0,,,*"));
        assert!(verify_checksum(&framed).is_ok());
    }

    #[test]
    fn test_encode_alarm() {
        let pflau = Pflau {
            rx: 1,
            tx: true,
            gps: GpsFix::Airborne,
            power: true,
            alarm_level: 3,
            relative_bearing: Some(-30),
            alarm_type: ALARM_TYPE_AIRCRAFT,
            relative_vertical: Some(-32),
            relative_distance: Some(755),
            id: Some(FlarmId::new(0xDD8F12, Some("D-KXYZ".into()))),
        };
        assert_eq!(pflau.body(), "PFLAU,1,1,2,1,3,-30,2,-32,755,DD8F12!D-KXYZ");
    }

    #[test]
    fn test_parse_alarm() {
        let s = Sentence::parse("$PFLAU,2,1,2,1,2,-30,2,-32,755,DD8F12*71").unwrap();
        let pflau = Pflau::parse(&s).unwrap();
        assert_eq!(pflau.rx, 2);
        assert_eq!(pflau.alarm_level, 2);
        assert_eq!(pflau.relative_bearing, Some(-30));
        assert_eq!(pflau.relative_vertical, Some(-32));
        assert_eq!(pflau.relative_distance, Some(755));
        assert_eq!(pflau.id.unwrap().address, 0xDD8F12);
    }

    #[test]
    fn test_parse_no_alarm() {
        let s = Sentence::parse("PFLAU,0,1,1,1,0,,0,,,").unwrap();
        let pflau = Pflau::parse(&s).unwrap();
        assert_eq!(pflau.gps, GpsFix::Ground);
        assert_eq!(pflau.relative_bearing, None);
        assert_eq!(pflau.id, None);
    }

    #[test]
    fn test_parse_too_short() {
        let s = Sentence::parse("PFLAU,0,1,1,1,0").unwrap();
        assert!(matches!(
            Pflau::parse(&s),
            Err(ParseError::TooFewFields { expected: 11, .. })
        ));
    }

    #[test]
    fn test_parse_garbage_numbers_default_to_zero() {
        let s = Sentence::parse("PFLAU,x,1,2,1,2,abc,2,-1e,7x,DD8F12").unwrap();
        let pflau = Pflau::parse(&s).unwrap();
        assert_eq!(pflau.rx, 0);
        assert_eq!(pflau.relative_bearing, Some(0));
        assert_eq!(pflau.relative_vertical, Some(0));
        assert_eq!(pflau.relative_distance, Some(0));
    }
}
