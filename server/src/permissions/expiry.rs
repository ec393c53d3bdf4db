//! Expiry markers attached to every grant.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::{GrantError, Result};

/// Literal stored in the ledger for permanent grants.
pub const NEVER: &str = "never";

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// When a grant stops applying.
///
/// Ordered by how long the grant lasts: any timestamp sorts before `Never`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExpiryMarker {
    /// Expires once the current time is past this instant.
    At(DateTime<Utc>),
    /// Permanent.
    Never,
}

impl ExpiryMarker {
    /// Build a marker from a duration in hours.
    ///
    /// Zero or negative durations mean the grant never expires.
    pub fn from_duration_hours(hours: f64, now: DateTime<Utc>) -> Result<Self> {
        if !hours.is_finite() {
            return Err(GrantError::InvalidDuration(hours));
        }
        if hours <= 0.0 {
            return Ok(Self::Never);
        }

        let millis = (hours * MILLIS_PER_HOUR).round();
        if millis >= i64::MAX as f64 {
            return Err(GrantError::InvalidDuration(hours));
        }
        TimeDelta::try_milliseconds(millis as i64)
            .and_then(|delta| now.checked_add_signed(delta))
            .map(Self::At)
            .ok_or(GrantError::InvalidDuration(hours))
    }

    /// Whether the grant has lapsed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Never => false,
            Self::At(at) => now > *at,
        }
    }

    /// Time left before the grant lapses, for display.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Remaining {
        match self {
            Self::Never => Remaining::Forever,
            Self::At(at) if *at > now => {
                Remaining::Hours((*at - now).num_milliseconds() as f64 / MILLIS_PER_HOUR)
            }
            Self::At(_) => Remaining::Hours(0.0),
        }
    }

    fn to_ledger_string(self) -> String {
        match self {
            Self::Never => NEVER.to_owned(),
            Self::At(at) => at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Parse the ledger representation.
    ///
    /// Accepts `"never"`, RFC 3339 timestamps, and naive ISO-8601 timestamps
    /// (no offset) which are read as UTC.
    pub fn parse(value: &str) -> Option<Self> {
        if value == NEVER {
            return Some(Self::Never);
        }
        if let Ok(at) = DateTime::parse_from_rfc3339(value) {
            return Some(Self::At(at.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Self::At(naive.and_utc()))
    }
}

impl fmt::Display for ExpiryMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("forever"),
            Self::At(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M UTC")),
        }
    }
}

impl Serialize for ExpiryMarker {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_ledger_string())
    }
}

impl<'de> Deserialize<'de> for ExpiryMarker {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("expected \"never\" or an ISO-8601 timestamp, got {s:?}"))
        })
    }
}

/// Remaining lifetime of a grant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Remaining {
    Forever,
    Hours(f64),
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forever => f.write_str("forever"),
            Self::Hours(hours) => write!(f, "{hours:.1} hour(s)"),
        }
    }
}
