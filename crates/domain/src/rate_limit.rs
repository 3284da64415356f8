//! Rate limit window types and wall-clock bucket math.
//!
//! Calls are counted in fixed buckets aligned to wall-clock minute and hour
//! boundaries. Both granularities share one table; a row's granularity is
//! implied by the rounding of its `window_start`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use gatewell_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// The key space a quota is tracked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// Authenticated user id.
    User,
    /// Raw client IP address.
    Ip,
}

impl IdentifierKind {
    /// Returns the stable storage representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ip => "ip",
        }
    }
}

impl FromStr for IdentifierKind {
    type Err = AppError;

    fn from_str(value: &str) -> AppResult<Self> {
        match value {
            "user" => Ok(Self::User),
            "ip" => Ok(Self::Ip),
            other => Err(AppError::Validation(format!(
                "unknown identifier kind '{other}'"
            ))),
        }
    }
}

impl Display for IdentifierKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Size of a counting bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowGranularity {
    /// Sixty-second bucket aligned to the wall-clock minute.
    Minute,
    /// One-hour bucket aligned to the wall-clock hour.
    Hour,
}

impl WindowGranularity {
    /// Returns the bucket length in whole seconds.
    #[must_use]
    pub fn seconds(&self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
        }
    }

    /// Returns the bucket length as a duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// Truncates an instant down to the enclosing bucket boundary.
    #[must_use]
    pub fn truncate(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let overshoot = instant.timestamp().rem_euclid(self.seconds());
        let subsec_nanos = i64::from(instant.timestamp_subsec_nanos());
        instant - Duration::seconds(overshoot) - Duration::nanoseconds(subsec_nanos)
    }

    /// Returns the exclusive end of the bucket starting at `window_start`.
    #[must_use]
    pub fn bucket_end(&self, window_start: DateTime<Utc>) -> DateTime<Utc> {
        window_start + self.duration()
    }

    /// Seconds a rejected caller must wait for the bucket starting at
    /// `window_start` to roll over. Never less than one.
    #[must_use]
    pub fn retry_after_seconds(&self, window_start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (self.bucket_end(window_start) - now).num_seconds().max(1)
    }
}

/// Accumulated call count for one identifier/function pair within one bucket.
///
/// At most one row exists per `(identifier, identifier_kind, function_name,
/// window_start)`; rows older than the hour horizon carry no information and
/// are purged opportunistically.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitWindow {
    /// User id or IP address the count is tracked against.
    pub identifier: String,
    /// Which key space `identifier` belongs to.
    pub identifier_kind: IdentifierKind,
    /// Name of the protected operation.
    pub function_name: String,
    /// Bucket key: the instant truncated to the bucket boundary.
    pub window_start: DateTime<Utc>,
    /// Number of admitted calls recorded in this bucket, at least one.
    pub request_count: i64,
}
