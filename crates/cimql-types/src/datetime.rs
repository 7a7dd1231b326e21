//! CIM datetime values
//!
//! CIM encodes both points in time and durations as fixed-width strings:
//!
//! - timestamp: `yyyymmddhhmmss.mmmmmmsutc`, where `s` is `+` or `-` and
//!   `utc` is the offset from UTC in minutes
//! - interval: `ddddddddhhmmss.mmmmmm:000`

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use cimql_diagnostics::{CIMQL0013, QueryError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const CIM_DATETIME_LEN: usize = 25;
const MICROS_PER_SECOND: u64 = 1_000_000;
const MICROS_PER_DAY: u64 = 86_400 * MICROS_PER_SECOND;

/// A CIM datetime: either a timestamp or an interval
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CimDateTime {
    /// A point in time with its UTC offset
    Timestamp(DateTime<FixedOffset>),
    /// A duration in microseconds
    Interval(u64),
}

impl CimDateTime {
    /// Build a timestamp from microseconds since 0000-01-01T00:00:00 UTC
    pub fn from_timestamp_micros(micros: u64) -> Result<Self, QueryError> {
        let micros = i64::try_from(micros).map_err(|_| out_of_range(micros))?;
        let instant = year_zero()
            .checked_add_signed(chrono::Duration::microseconds(micros))
            .ok_or_else(|| out_of_range(micros as u64))?;
        Ok(Self::Timestamp(instant.fixed_offset()))
    }

    /// Build an interval from a microsecond count
    pub fn from_interval_micros(micros: u64) -> Self {
        Self::Interval(micros)
    }

    /// Current UTC time
    pub fn now() -> Self {
        Self::Timestamp(Utc::now().fixed_offset())
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, Self::Interval(_))
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self, Self::Timestamp(_))
    }

    /// Microseconds since 0000-01-01 UTC for timestamps, the duration for intervals
    pub fn to_microseconds(&self) -> u64 {
        match self {
            Self::Interval(micros) => *micros,
            Self::Timestamp(ts) => {
                let elapsed = ts.with_timezone(&Utc) - year_zero();
                elapsed.num_microseconds().map_or(0, |m| m.max(0) as u64)
            }
        }
    }

    /// Ordering between values of the same kind; timestamps and intervals do not compare
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            (Self::Interval(a), Self::Interval(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn year_zero() -> DateTime<Utc> {
    // 0000-01-01 is representable in chrono's proleptic calendar
    NaiveDate::from_ymd_opt(0, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn out_of_range(micros: u64) -> QueryError {
    QueryError::syntax(
        CIMQL0013,
        format!("{} microseconds is outside the timestamp range", micros),
    )
}

fn invalid(input: &str, reason: &str) -> QueryError {
    QueryError::syntax(CIMQL0013, format!("invalid CIM datetime '{}': {}", input, reason))
}

fn digits(input: &str, range: std::ops::Range<usize>) -> Result<u32, QueryError> {
    let part = &input[range];
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(input, "expected digits"));
    }
    part.parse().map_err(|_| invalid(input, "expected digits"))
}

impl PartialEq for CimDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl FromStr for CimDateTime {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CIM_DATETIME_LEN || !s.is_ascii() {
            return Err(invalid(s, "expected 25 characters"));
        }
        if &s[14..15] != "." {
            return Err(invalid(s, "expected '.' at position 14"));
        }
        let micros = digits(s, 15..21)?;

        match &s[21..22] {
            ":" => {
                if &s[22..25] != "000" {
                    return Err(invalid(s, "interval must end with ':000'"));
                }
                let days = u64::from(digits(s, 0..8)?);
                let hours = u64::from(digits(s, 8..10)?);
                let minutes = u64::from(digits(s, 10..12)?);
                let seconds = u64::from(digits(s, 12..14)?);
                if hours > 23 || minutes > 59 || seconds > 59 {
                    return Err(invalid(s, "time field out of range"));
                }
                let total = days * MICROS_PER_DAY
                    + ((hours * 60 + minutes) * 60 + seconds) * MICROS_PER_SECOND
                    + u64::from(micros);
                Ok(Self::Interval(total))
            }
            sign @ ("+" | "-") => {
                let offset_minutes = digits(s, 22..25)? as i32;
                let offset_seconds = if sign == "+" {
                    offset_minutes * 60
                } else {
                    -offset_minutes * 60
                };
                let offset = FixedOffset::east_opt(offset_seconds)
                    .ok_or_else(|| invalid(s, "UTC offset out of range"))?;
                let naive = NaiveDate::from_ymd_opt(
                    digits(s, 0..4)? as i32,
                    digits(s, 4..6)?,
                    digits(s, 6..8)?,
                )
                .and_then(|d| {
                    d.and_hms_micro_opt(
                        digits(s, 8..10).ok()?,
                        digits(s, 10..12).ok()?,
                        digits(s, 12..14).ok()?,
                        micros,
                    )
                })
                .ok_or_else(|| invalid(s, "date or time field out of range"))?;
                let ts = offset
                    .from_local_datetime(&naive)
                    .single()
                    .ok_or_else(|| invalid(s, "ambiguous local time"))?;
                Ok(Self::Timestamp(ts))
            }
            _ => Err(invalid(s, "expected '+', '-' or ':' at position 21")),
        }
    }
}

impl TryFrom<String> for CimDateTime {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CimDateTime> for String {
    fn from(value: CimDateTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CimDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ts) => {
                let offset_minutes = ts.offset().local_minus_utc() / 60;
                let sign = if offset_minutes < 0 { '-' } else { '+' };
                write!(
                    f,
                    "{:04}{:02}{:02}{:02}{:02}{:02}.{:06}{}{:03}",
                    ts.year(),
                    ts.month(),
                    ts.day(),
                    ts.hour(),
                    ts.minute(),
                    ts.second(),
                    ts.nanosecond() / 1_000 % 1_000_000,
                    sign,
                    offset_minutes.abs()
                )
            }
            Self::Interval(total) => {
                let days = total / MICROS_PER_DAY;
                let rest = total % MICROS_PER_DAY;
                let secs = rest / MICROS_PER_SECOND;
                write!(
                    f,
                    "{:08}{:02}{:02}{:02}.{:06}:000",
                    days,
                    secs / 3600,
                    secs / 60 % 60,
                    secs % 60,
                    rest % MICROS_PER_SECOND
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let dt: CimDateTime = "20240131123000.000250+060".parse().unwrap();
        assert!(dt.is_timestamp());
        assert_eq!(dt.to_string(), "20240131123000.000250+060");
    }

    #[test]
    fn test_parse_interval() {
        let dt: CimDateTime = "00000001020304.000005:000".parse().unwrap();
        assert_eq!(
            dt.to_microseconds(),
            MICROS_PER_DAY + (2 * 3600 + 3 * 60 + 4) * MICROS_PER_SECOND + 5
        );
        assert_eq!(dt.to_string(), "00000001020304.000005:000");
    }

    #[test]
    fn test_offsets_compare_by_instant() {
        let utc: CimDateTime = "20240101120000.000000+000".parse().unwrap();
        let plus_one: CimDateTime = "20240101130000.000000+060".parse().unwrap();
        assert_eq!(utc, plus_one);
    }

    #[test]
    fn test_timestamp_and_interval_do_not_compare() {
        let ts: CimDateTime = "20240101120000.000000+000".parse().unwrap();
        let iv = CimDateTime::from_interval_micros(5);
        assert_eq!(ts.compare(&iv), None);
        assert_ne!(ts, iv);
    }

    #[test]
    fn test_microsecond_round_trip() {
        let ts: CimDateTime = "19700101000000.000000+000".parse().unwrap();
        let back = CimDateTime::from_timestamp_micros(ts.to_microseconds()).unwrap();
        assert_eq!(ts, back);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("2024".parse::<CimDateTime>().is_err());
        assert!("20241301000000.000000+000".parse::<CimDateTime>().is_err());
        assert!("00000001020304.000005:001".parse::<CimDateTime>().is_err());
        assert!("20240101000000x000000+000".parse::<CimDateTime>().is_err());
    }
}
