//! Timestamps in seconds since the Unix epoch.
//!
//! OSM XML writes timestamps in the fixed `YYYY-MM-DDThh:mm:ssZ`
//! convention. Parsing is a small pure function here; no calendar
//! library is involved.

use std::fmt;

use crate::error::ReadError;

/// A point in time with one-second resolution.
///
/// The value 0 doubles as "not set": objects without a timestamp
/// attribute carry it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Seconds since the Unix epoch.
    pub fn seconds(&self) -> i64 {
        self.0
    }

    /// Whether this timestamp was actually set.
    pub fn is_set(&self) -> bool {
        self.0 != 0
    }

    /// Parse a timestamp from the `YYYY-MM-DDThh:mm:ssZ` convention.
    pub fn parse(text: &str) -> Result<Self, ReadError> {
        let bytes = text.as_bytes();
        let fail = || ReadError::Markup {
            reason: format!("invalid timestamp '{text}'"),
        };
        if bytes.len() != 20
            || bytes[4] != b'-'
            || bytes[7] != b'-'
            || bytes[10] != b'T'
            || bytes[13] != b':'
            || bytes[16] != b':'
            || bytes[19] != b'Z'
        {
            return Err(fail());
        }
        let num = |range: std::ops::Range<usize>| -> Result<i64, ReadError> {
            let s = &text[range];
            if !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail());
            }
            s.parse::<i64>().map_err(|_| fail())
        };
        let year = num(0..4)?;
        let month = num(5..7)?;
        let day = num(8..10)?;
        let hour = num(11..13)?;
        let minute = num(14..16)?;
        let second = num(17..19)?;
        if !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
            || hour > 23
            || minute > 59
            || second > 60
        {
            return Err(fail());
        }
        let days = days_from_civil(year, month, day);
        Ok(Timestamp(days * 86_400 + hour * 3_600 + minute * 60 + second))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
///
/// Howard Hinnant's days-from-civil algorithm.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let mp = if month > 2 { month - 3 } else { month + 9 };
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
