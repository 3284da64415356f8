use gatewell_core::{AppError, AppResult};

/// Quota pair for one protected function, validated at construction.
///
/// The caller owns this configuration and hands it in per check; distinct
/// functions may declare different pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaConfig {
    requests_per_minute: i64,
    requests_per_hour: i64,
}

impl QuotaConfig {
    /// Creates a validated quota pair. Both limits must be strictly positive.
    pub fn new(requests_per_minute: i64, requests_per_hour: i64) -> AppResult<Self> {
        if requests_per_minute <= 0 {
            return Err(AppError::Validation(
                "requests_per_minute must be greater than zero".to_owned(),
            ));
        }

        if requests_per_hour <= 0 {
            return Err(AppError::Validation(
                "requests_per_hour must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            requests_per_minute,
            requests_per_hour,
        })
    }

    /// Maximum admitted calls per wall-clock minute bucket.
    #[must_use]
    pub fn requests_per_minute(&self) -> i64 {
        self.requests_per_minute
    }

    /// Maximum admitted calls per wall-clock hour bucket.
    #[must_use]
    pub fn requests_per_hour(&self) -> i64 {
        self.requests_per_hour
    }
}
