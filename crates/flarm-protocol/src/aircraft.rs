//! FLARM aircraft type codes
//!
//! The last field of `PFLAA` is a single hex digit classifying the target.

/// Aircraft type as reported in `PFLAA`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AircraftType {
    /// 0, A and E on the wire
    #[default]
    Unknown,
    /// 1 - glider / motor glider
    Glider,
    /// 2 - tow / tug plane
    TowPlane,
    /// 3 - helicopter / rotorcraft
    Helicopter,
    /// 4 - skydiver
    Skydiver,
    /// 5 - drop plane for skydivers
    DropPlane,
    /// 6 - hang glider (hard)
    HangGlider,
    /// 7 - paraglider (soft)
    Paraglider,
    /// 8 - aircraft with reciprocating engine(s)
    Piston,
    /// 9 - aircraft with jet/turboprop engine(s)
    Jet,
    /// B - balloon
    Balloon,
    /// C - airship
    Airship,
    /// D - unmanned aerial vehicle
    Uav,
    /// F - static object
    StaticObject,
}

impl AircraftType {
    /// Decode the hex digit from the wire; unknown codes map to `Unknown`
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "1" => Self::Glider,
            "2" => Self::TowPlane,
            "3" => Self::Helicopter,
            "4" => Self::Skydiver,
            "5" => Self::DropPlane,
            "6" => Self::HangGlider,
            "7" => Self::Paraglider,
            "8" => Self::Piston,
            "9" => Self::Jet,
            "B" => Self::Balloon,
            "C" => Self::Airship,
            "D" => Self::Uav,
            "F" => Self::StaticObject,
            _ => Self::Unknown,
        }
    }

    /// Hex digit used on the wire
    pub fn code(&self) -> char {
        match self {
            Self::Unknown => '0',
            Self::Glider => '1',
            Self::TowPlane => '2',
            Self::Helicopter => '3',
            Self::Skydiver => '4',
            Self::DropPlane => '5',
            Self::HangGlider => '6',
            Self::Paraglider => '7',
            Self::Piston => '8',
            Self::Jet => '9',
            Self::Balloon => 'B',
            Self::Airship => 'C',
            Self::Uav => 'D',
            Self::StaticObject => 'F',
        }
    }
}
