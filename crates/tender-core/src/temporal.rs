//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only wrapper around `chrono::DateTime<Utc>`.
//!
//! Every deadline comparison in the lifecycle engine — "is this
//! opportunity still open", "has the proposal deadline elapsed" — runs on
//! this type, so there is exactly one notion of "now" and one timezone.
//! Inputs carrying another offset are converted to UTC at the parse
//! boundary rather than rejected; clients submit deadlines in local time
//! and the stored instant is what matters.
//!
//! Date-only inputs (`YYYY-MM-DD`) normalize to 16:00 UTC, the
//! marketplace's close-of-business convention for deadlines: a proposal
//! deadline of "March 3rd" means 4 PM that day, not midnight.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Hour of day (UTC) that a date-only deadline resolves to.
const CLOSE_OF_BUSINESS_HOUR: u32 = 16;

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse a timestamp from an RFC 3339 string, accepting any timezone
    /// offset and converting to UTC.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| CoreError::InvalidTimestamp {
            raw: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Parse a date-only string (`YYYY-MM-DD`), resolving to 16:00 UTC
    /// on that day (close of business for deadline semantics).
    pub fn parse_date(s: &str) -> Result<Self, CoreError> {
        let date =
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| CoreError::InvalidTimestamp {
                raw: s.to_string(),
                reason: e.to_string(),
            })?;
        // NaiveTime construction with in-range constants cannot fail.
        let time = NaiveTime::from_hms_opt(CLOSE_OF_BUSINESS_HOUR, 0, 0)
            .unwrap_or(NaiveTime::MIN);
        Ok(Self(DateTime::from_naive_utc_and_offset(
            date.and_time(time),
            Utc,
        )))
    }

    /// Parse either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
    pub fn parse_flexible(s: &str) -> Result<Self, CoreError> {
        Self::parse(s).or_else(|_| Self::parse_date(s))
    }

    /// Create a timestamp from a Unix epoch timestamp (seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        let dt = DateTime::from_timestamp(secs, 0).ok_or_else(|| CoreError::InvalidTimestamp {
            raw: secs.to_string(),
            reason: "out of range for a Unix timestamp".to_string(),
        })?;
        Ok(Self(dt))
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Render as ISO 8601 with Z suffix, seconds precision
    /// (e.g., `2026-01-15T16:00:00Z`).
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
