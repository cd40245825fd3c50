//! RFC 3339 timestamps compared by the instant they denote.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a string is not an RFC 3339 date-time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Date and time must be joined by an uppercase `T`, and a UTC offset
    /// must be an uppercase `Z`.
    #[error("date and time must be separated by 'T' and UTC written as 'Z'")]
    Layout,

    #[error(transparent)]
    Chrono(#[from] chrono::ParseError),
}

/// A date-time in the RFC 3339 profile, e.g. `2024-01-01T09:00:00.123+09:00`.
///
/// Two values are equal when they denote the same instant, no matter how
/// they were written: `2024-01-01T00:00:00Z` equals `2024-01-01T09:00:00+09:00`.
/// The offset a value was parsed with is kept for display.
#[derive(Debug, Clone, Copy)]
pub struct Rfc3339(DateTime<FixedOffset>);

impl Rfc3339 {
    /// Parse a date-time with a mandatory offset (`Z` or `±hh:mm`) and
    /// optional fractional seconds.
    ///
    /// The layout is `YYYY-MM-DDThh:mm:ss[.frac]<offset>`; the lowercase and
    /// space separators chrono would also accept are rejected.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if s.as_bytes().get(10) != Some(&b'T') || s.ends_with('z') {
            return Err(TimestampError::Layout);
        }
        Ok(Self(DateTime::parse_from_rfc3339(s)?))
    }

    /// Current time, in UTC.
    pub fn now() -> Self {
        Self(Utc::now().fixed_offset())
    }

    /// True when both values denote the same instant.
    pub fn equiv(&self, other: &Self) -> bool {
        self.0.timestamp() == other.0.timestamp()
            && self.0.timestamp_subsec_nanos() == other.0.timestamp_subsec_nanos()
    }

    /// The parsed date-time with its original offset.
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// The same instant in UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl PartialEq for Rfc3339 {
    fn eq(&self, other: &Self) -> bool {
        self.equiv(other)
    }
}

impl Eq for Rfc3339 {}

impl fmt::Display for Rfc3339 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromStr for Rfc3339 {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DateTime<FixedOffset>> for Rfc3339 {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self(dt)
    }
}

impl From<DateTime<Utc>> for Rfc3339 {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.fixed_offset())
    }
}

impl Serialize for Rfc3339 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rfc3339 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(|e| de::Error::custom(format!("{s:?} is not a RFC3339 date-time: {e}")))
    }
}
