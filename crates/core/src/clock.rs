//! Time Source
//!
//! Reading the current time is the only impurity in the state aggregator. It is
//! isolated behind the `Clock` trait so callers can pin timestamps in tests and
//! replays.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error};

/// Format used for the timestamp suffix of session and plan identifiers.
pub const ID_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Supplies the current time to initializers and updaters.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant, for deterministic replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Formats `at` as the identifier suffix, e.g. `20240115_103000`.
pub fn id_timestamp(at: DateTime<Utc>) -> String {
    at.format(ID_TIMESTAMP_FORMAT).to_string()
}

/// Parses an RFC 3339 timestamp, or an ISO 8601 one without an offset
/// (`2024-01-15T10:30:00.123456`), which is read as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(text) {
        Ok(at) => Ok(at.with_timezone(&Utc)),
        Err(_) => text.parse::<NaiveDateTime>().map(|naive| naive.and_utc()),
    }
}

/// Serde helper accepting any timestamp [`parse_timestamp`] accepts.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_timestamp(&text).map_err(Error::custom)
}

/// Like [`deserialize_timestamp`], with `null` read as `None`.
pub fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(text) => parse_timestamp(&text).map(Some).map_err(Error::custom),
        None => Ok(None),
    }
}
