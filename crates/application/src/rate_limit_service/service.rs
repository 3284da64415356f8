use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use gatewell_core::{AppResult, NonEmptyString};
use gatewell_domain::{IdentifierKind, WindowGranularity};

use super::config::QuotaConfig;
use super::ports::RateLimitWindowRepository;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the call may proceed.
    pub allowed: bool,
    /// Seconds until the rejecting bucket rolls over; set on rejections.
    pub retry_after_seconds: Option<i64>,
}

impl RateLimitDecision {
    fn admitted() -> Self {
        Self {
            allowed: true,
            retry_after_seconds: None,
        }
    }

    fn rejected(retry_after_seconds: i64) -> Self {
        Self {
            allowed: false,
            retry_after_seconds: Some(retry_after_seconds),
        }
    }
}

/// Application service enforcing the per-minute and per-hour quotas.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitWindowRepository>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitWindowRepository>) -> Self {
        Self { repository }
    }

    /// Decides whether the current call is admitted under both windows and,
    /// if so, records it in both buckets.
    ///
    /// Never fails: a storage error on any step resolves to an admitted
    /// decision and a warning log. Rejected calls are not recorded, so a
    /// caller is never double-rejected for a single increment.
    pub async fn check_and_record(
        &self,
        identifier: &NonEmptyString,
        identifier_kind: IdentifierKind,
        function_name: &NonEmptyString,
        quota: QuotaConfig,
    ) -> RateLimitDecision {
        self.check_and_record_at(identifier, identifier_kind, function_name, quota, Utc::now())
            .await
    }

    pub(super) async fn check_and_record_at(
        &self,
        identifier: &NonEmptyString,
        identifier_kind: IdentifierKind,
        function_name: &NonEmptyString,
        quota: QuotaConfig,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        // Housekeeping first: nothing looks further back than the hour bucket.
        let horizon = now - WindowGranularity::Hour.duration();
        if let Err(error) = self.repository.purge_windows_before(horizon).await {
            warn!(error = %error, "rate limit window purge failed");
        }

        match self
            .try_admit(identifier, identifier_kind, function_name, quota, now)
            .await
        {
            Ok(decision) => decision,
            Err(error) => {
                warn!(
                    function = %function_name,
                    identifier_kind = %identifier_kind,
                    error = %error,
                    "rate limit check degraded to fail-open"
                );
                RateLimitDecision::admitted()
            }
        }
    }

    async fn try_admit(
        &self,
        identifier: &NonEmptyString,
        identifier_kind: IdentifierKind,
        function_name: &NonEmptyString,
        quota: QuotaConfig,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitDecision> {
        let windows = [
            (WindowGranularity::Minute, quota.requests_per_minute()),
            (WindowGranularity::Hour, quota.requests_per_hour()),
        ];

        for (granularity, limit) in windows {
            let window_start = granularity.truncate(now);
            let window = self
                .repository
                .find_window(
                    identifier.as_str(),
                    identifier_kind,
                    function_name.as_str(),
                    window_start,
                )
                .await?;

            if let Some(window) = window
                && window.request_count >= limit
            {
                return Ok(RateLimitDecision::rejected(
                    granularity.retry_after_seconds(window_start, now),
                ));
            }
        }

        // Quota counts attempts: the increment happens before the caller's
        // business logic runs and is not refunded if that logic later fails.
        for (granularity, _) in windows {
            self.repository
                .record_call(
                    identifier.as_str(),
                    identifier_kind,
                    function_name.as_str(),
                    granularity.truncate(now),
                )
                .await?;
        }

        Ok(RateLimitDecision::admitted())
    }

    /// Removes window rows past the retention horizon. Intended for periodic
    /// cleanup alongside the opportunistic purge in each check.
    pub async fn cleanup(&self) -> AppResult<u64> {
        let cutoff = Utc::now() - WindowGranularity::Hour.duration();
        self.repository.purge_windows_before(cutoff).await
    }
}
