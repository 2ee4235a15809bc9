//! Flat-earth geodesy for short-range traffic geometry
//!
//! Collision geometry only matters within a few tens of kilometers, where an
//! equirectangular approximation is accurate to well under a percent. None
//! of these functions handle the ±180° longitude seam.

/// Mean earth radius, meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude on the mean-radius sphere
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Meters per degree of latitude using the 60 NM per degree convention
///
/// Used when FLARM relative offsets are turned back into positions.
pub const METERS_PER_DEGREE_NM: f64 = 111_120.0;

/// Meters per nautical mile
pub const METERS_PER_NM: f64 = 1852.0;

/// Relative geometry from one position to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectGeometry {
    /// Horizontal distance, meters
    pub distance_m: f64,
    /// True bearing, degrees in [0, 360)
    pub bearing_deg: f64,
    /// Meters north (negative = south)
    pub north_m: f64,
    /// Meters east (negative = west)
    pub east_m: f64,
}

/// Distance, bearing and north/east offsets from `(lat1, lng1)` to `(lat2, lng2)`
///
/// Longitude degrees are scaled by the cosine of the mean latitude; the
/// distance is the Euclidean norm of the offsets.
pub fn rect_distance_bearing(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> RectGeometry {
    let mean_lat = ((lat1 + lat2) / 2.0).to_radians();
    let north_m = (lat2 - lat1) * METERS_PER_DEGREE;
    let east_m = (lng2 - lng1) * METERS_PER_DEGREE * mean_lat.cos().abs();

    RectGeometry {
        distance_m: north_m.hypot(east_m),
        bearing_deg: normalize_bearing(east_m.atan2(north_m).to_degrees()),
        north_m,
        east_m,
    }
}

/// Position reached from `(lat, lng)` after `distance_nm` along `bearing_deg`
///
/// Spherical destination formula; agrees with [`rect_distance_bearing`]
/// within rounding at the ranges traffic is reported at.
pub fn project_position(lat: f64, lng: f64, bearing_deg: f64, distance_nm: f64) -> (f64, f64) {
    let lat1 = lat.to_radians();
    let lng1 = lng.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_nm * METERS_PER_NM / EARTH_RADIUS_M;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lng2 = lng1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    (lat2.to_degrees(), lng2.to_degrees())
}

/// Position offset by `north_m`/`east_m` meters, 60 NM-per-degree convention
///
/// The longitude scale uses the mean of the own and the offset latitude.
/// At the poles the longitude offset is undefined and left at zero.
pub fn offset_position(lat: f64, lng: f64, north_m: f64, east_m: f64) -> (f64, f64) {
    let lat2 = lat + north_m / METERS_PER_DEGREE_NM;
    let mean_lat = ((lat + lat2) / 2.0).to_radians();
    let cos = mean_lat.cos();

    let lng2 = if cos.abs() > 1e-9 {
        lng + east_m / (METERS_PER_DEGREE_NM * cos)
    } else {
        lng
    };

    (lat2, lng2)
}

/// Normalize a bearing to [0, 360)
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}

/// Wrap an angle difference to [-180, 180]
pub fn wrap_relative(deg: f64) -> f64 {
    let mut d = deg.rem_euclid(360.0);
    if d > 180.0 {
        d -= 360.0;
    }
    d
}
