//! Fixed-point geographic coordinates.
//!
//! A [`Location`] stores longitude and latitude as 32-bit integers scaled
//! by 10^7, which is precise to about a centimetre and half the size of a
//! pair of doubles. A coordinate can also be "undefined", encoded as the
//! sentinel [`Location::UNDEFINED_COORDINATE`].

use std::fmt;

/// Scaling factor between degrees and the fixed-point representation.
pub const COORDINATE_SCALE: f64 = 10_000_000.0;

/// A lon/lat pair in fixed-point representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    lon: i32,
    lat: i32,
}

impl Location {
    /// Sentinel for a coordinate that was not present in the input.
    pub const UNDEFINED_COORDINATE: i32 = i32::MAX;

    /// A location with both coordinates undefined.
    pub const UNDEFINED: Location = Location {
        lon: Self::UNDEFINED_COORDINATE,
        lat: Self::UNDEFINED_COORDINATE,
    };

    /// Create a location from raw fixed-point coordinates.
    pub fn from_raw(lon: i32, lat: i32) -> Self {
        Self { lon, lat }
    }

    /// Create a location from coordinates in degrees.
    pub fn from_degrees(lon: f64, lat: f64) -> Self {
        Self {
            lon: (lon * COORDINATE_SCALE).round() as i32,
            lat: (lat * COORDINATE_SCALE).round() as i32,
        }
    }

    /// Raw fixed-point longitude.
    pub fn raw_lon(&self) -> i32 {
        self.lon
    }

    /// Raw fixed-point latitude.
    pub fn raw_lat(&self) -> i32 {
        self.lat
    }

    /// Longitude in degrees. Meaningless if the coordinate is undefined.
    pub fn lon(&self) -> f64 {
        f64::from(self.lon) / COORDINATE_SCALE
    }

    /// Latitude in degrees. Meaningless if the coordinate is undefined.
    pub fn lat(&self) -> f64 {
        f64::from(self.lat) / COORDINATE_SCALE
    }

    /// Overwrite the longitude with a value in degrees.
    pub fn set_lon(&mut self, lon: f64) {
        self.lon = (lon * COORDINATE_SCALE).round() as i32;
    }

    /// Overwrite the latitude with a value in degrees.
    pub fn set_lat(&mut self, lat: f64) {
        self.lat = (lat * COORDINATE_SCALE).round() as i32;
    }

    /// Whether both coordinates are defined.
    pub fn is_defined(&self) -> bool {
        self.lon != Self::UNDEFINED_COORDINATE && self.lat != Self::UNDEFINED_COORDINATE
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_defined() {
            write!(f, "({}, {})", self.lon(), self.lat())
        } else {
            write!(f, "(undefined)")
        }
    }
}

/// Parse a coordinate from attribute text.
///
/// Always uses '.' as the decimal separator, independent of the host
/// locale. With `atof` semantics, trailing garbage after the number is
/// ignored and unparseable input yields 0.0.
pub fn parse_coordinate(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        seen_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            seen_digit = true;
        }
    }
    if seen_digit && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    if !seen_digit {
        return 0.0;
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}
