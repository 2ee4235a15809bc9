//! `GPRMC` and `GPGGA` own-ship position sentences
//!
//! Glider computers expect the FLARM data port to carry the device's own
//! GPS solution alongside traffic. Only encoding is provided; own-ship
//! position is consumed from elsewhere.

use chrono::NaiveDate;

use crate::EncodeSentence;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// `GPRMC` status field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixStatus {
    /// `A` - data valid
    Active,
    /// `V` - navigation receiver warning
    #[default]
    Void,
}

/// NMEA 2.3 mode indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixMode {
    /// `N` - no fix
    #[default]
    NoFix,
    /// `A` - autonomous
    Autonomous,
    /// `D` - differential
    Differential,
}

impl FixMode {
    /// Mode from a GGA fix quality code (1 = GPS, 2 = DGPS)
    pub fn from_quality(quality: u8) -> Self {
        match quality {
            1 => FixMode::Autonomous,
            2 => FixMode::Differential,
            _ => FixMode::NoFix,
        }
    }

    fn letter(&self) -> char {
        match self {
            FixMode::NoFix => 'N',
            FixMode::Autonomous => 'A',
            FixMode::Differential => 'D',
        }
    }
}

/// Recommended minimum navigation data
#[derive(Debug, Clone, PartialEq)]
pub struct Gprmc {
    /// Seconds since midnight UTC of the fix
    pub time_of_day: Option<f64>,
    pub status: FixStatus,
    pub position: Option<Position>,
    /// Ground speed in knots
    pub speed_knots: Option<f64>,
    /// Track made good, degrees true
    pub course: Option<f64>,
    /// UTC date
    pub date: NaiveDate,
    pub mode: FixMode,
}

impl Gprmc {
    pub const TALKER: &'static str = "GPRMC";
}

impl EncodeSentence for Gprmc {
    fn body(&self) -> String {
        let status = match self.status {
            FixStatus::Active => 'A',
            FixStatus::Void => 'V',
        };
        // Magnetic variation and its hemisphere are always empty
        format!(
            "{},{},{},{},{:.1},{:.1},{},,,{}",
            Self::TALKER,
            self.time_of_day.map(format_time).unwrap_or_default(),
            status,
            format_position(self.position),
            OptFmt(self.speed_knots),
            OptFmt(self.course),
            self.date.format("%d%m%y"),
            self.mode.letter(),
        )
    }
}

/// Fix information
#[derive(Debug, Clone, PartialEq)]
pub struct Gpgga {
    /// Seconds since midnight UTC of the fix
    pub time_of_day: Option<f64>,
    pub position: Option<Position>,
    /// 0 = invalid, 1 = GPS, 2 = DGPS
    pub quality: u8,
    /// Satellites used in the solution
    pub satellites: u16,
    /// Horizontal dilution of precision
    pub hdop: Option<f64>,
    /// Altitude above mean sea level, meters
    pub altitude_m: Option<f64>,
    /// Geoid separation, meters
    pub geoid_separation_m: Option<f64>,
}

impl Gpgga {
    pub const TALKER: &'static str = "GPGGA";
}

impl EncodeSentence for Gpgga {
    fn body(&self) -> String {
        // Differential age and station ID are always empty
        format!(
            "{},{},{},{},{},{:.2},{:.1},{},{:.1},{},,",
            Self::TALKER,
            self.time_of_day.map(format_time).unwrap_or_default(),
            format_position(self.position),
            self.quality,
            self.satellites,
            OptFmt(self.hdop),
            OptFmt(self.altitude_m),
            unit(self.altitude_m),
            OptFmt(self.geoid_separation_m),
            unit(self.geoid_separation_m),
        )
    }
}

/// `hhmmss.ss` from seconds since midnight
///
/// Rounds to centiseconds before splitting, so 59.999 s carries into the
/// next minute instead of printing as `60.00`.
pub fn format_time(seconds: f64) -> String {
    const CENTIS_PER_DAY: u64 = 24 * 3600 * 100;
    let centis = ((seconds.max(0.0) * 100.0).round() as u64) % CENTIS_PER_DAY;
    let hours = centis / 360_000;
    let minutes = centis / 6_000 % 60;
    let secs = centis % 6_000;
    format!("{:02}{:02}{:02}.{:02}", hours, minutes, secs / 100, secs % 100)
}

/// `ddmm.mmmmm,N,dddmm.mmmmm,E`, or four empty fields
fn format_position(position: Option<Position>) -> String {
    let Some(p) = position else {
        return ",,,".to_string();
    };
    let ns = if p.latitude < 0.0 { 'S' } else { 'N' };
    let ew = if p.longitude < 0.0 { 'W' } else { 'E' };
    format!(
        "{:010.5},{},{:011.5},{}",
        degrees_minutes(p.latitude.abs()),
        ns,
        degrees_minutes(p.longitude.abs()),
        ew
    )
}

/// `dddmm.mmmmm` as a number, minutes rounded to the printed precision
/// first so they never read `60.00000`
fn degrees_minutes(degrees: f64) -> f64 {
    const UNITS_PER_MINUTE: f64 = 100_000.0;
    const UNITS_PER_DEGREE: u64 = 60 * 100_000;
    let units = (degrees * 60.0 * UNITS_PER_MINUTE).round() as u64;
    let whole = units / UNITS_PER_DEGREE;
    let minutes = (units % UNITS_PER_DEGREE) as f64 / UNITS_PER_MINUTE;
    whole as f64 * 100.0 + minutes
}

fn unit(value: Option<f64>) -> &'static str {
    if value.is_some() {
        "M"
    } else {
        ""
    }
}

/// Formats `Some(v)` with the caller's precision and `None` as empty
struct OptFmt(Option<f64>);

impl std::fmt::Display for OptFmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(v) => std::fmt::Display::fmt(&v, f),
            None => Ok(()),
        }
    }
}
