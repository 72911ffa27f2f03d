//! Microsecond-precision timestamp type
//!
//! `timestamp` fields decode to this type. Stored values may arrive in three
//! shapes (epoch seconds, a date/time literal, or an already-typed instant);
//! all of them normalize to a `Timestamp`.
//!
//! ## Precision
//!
//! Timestamps are stored as signed microseconds since Unix epoch
//! (1970-01-01 00:00:00 UTC), so instants before 1970 are representable.
//!
//! ## Usage
//!
//! ```
//! use keyline_model::Timestamp;
//!
//! let from_secs = Timestamp::from_secs(1_000).unwrap();
//! let parsed = Timestamp::parse("1970-01-01T00:16:40Z").unwrap();
//! assert_eq!(from_secs, parsed);
//!
//! let before_epoch = Timestamp::parse("1969-12-31T23:59:00Z").unwrap();
//! assert_eq!(before_epoch.as_secs(), -60);
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted zoned layouts besides RFC 3339
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Accepted layouts without an offset (read as UTC)
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const MICROS_PER_SEC: i64 = 1_000_000;

/// Microsecond-precision timestamp
///
/// ## Invariants
///
/// - Timestamps are signed: negative values are instants before Unix epoch
/// - Timestamps are always in microseconds
/// - The zero timestamp represents Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

/// Date/time literal could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampParseError {
    /// No supported layout matched
    #[error("unrecognized date/time literal '{0}'")]
    Unrecognized(String),
}

impl Timestamp {
    /// Unix epoch (1970-01-01 00:00:00 UTC)
    pub const EPOCH: Timestamp = Timestamp(0);

    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a timestamp from microseconds since epoch
    #[inline]
    pub const fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    /// Create a timestamp from seconds since epoch
    ///
    /// Returns `None` when the instant does not fit in `i64` microseconds.
    #[inline]
    pub const fn from_secs(secs: i64) -> Option<Self> {
        match secs.checked_mul(MICROS_PER_SEC) {
            Some(micros) => Some(Timestamp(micros)),
            None => None,
        }
    }

    /// Create a timestamp from a chrono UTC datetime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp(dt.timestamp_micros())
    }

    /// Parse a date/time literal
    ///
    /// Accepts RFC 3339 (`2016-03-01T12:30:00+01:00`), the space separated
    /// form with an offset (`2016-03-01 12:30:00 +0100`), the same without
    /// an offset (read as UTC), and a bare date (`2016-03-01`, midnight UTC).
    pub fn parse(literal: &str) -> Result<Self, TimestampParseError> {
        let s = literal.trim();

        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                ZONED_FORMATS
                    .iter()
                    .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
                    .map(|dt| dt.with_timezone(&Utc))
            })
            .or_else(|| {
                NAIVE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| Utc.from_utc_datetime(&naive))
            })
            .map(Self::from_datetime)
            .ok_or_else(|| TimestampParseError::Unrecognized(literal.to_string()))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get microseconds since Unix epoch
    #[inline]
    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    /// Get whole seconds since Unix epoch, rounding toward negative infinity
    #[inline]
    pub const fn as_secs(&self) -> i64 {
        self.0.div_euclid(MICROS_PER_SEC)
    }

    /// Convert to a chrono UTC datetime
    ///
    /// Returns `None` outside chrono's representable range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = (self.0.rem_euclid(MICROS_PER_SEC) * 1_000) as u32;
        Utc.timestamp_opt(self.as_secs(), nanos).single()
    }

    /// Format as RFC 3339 with microsecond precision
    ///
    /// Instants outside chrono's range fall back to raw microseconds.
    pub fn to_rfc3339(&self) -> String {
        match self.to_datetime() {
            Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Micros, true),
            None => format!("{}us", self.0),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::EPOCH
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl std::str::FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

// ============================================================================
// Tests
// ============================================================================
