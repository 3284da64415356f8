use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use gatewell_core::{AppError, AppResult, NonEmptyString};
use gatewell_domain::{IdentifierKind, RateLimitWindow};

use super::{QuotaConfig, RateLimitService, RateLimitWindowRepository};

type WindowKey = (String, IdentifierKind, String, DateTime<Utc>);

#[derive(Default)]
struct TestWindowRepo {
    windows: Mutex<HashMap<WindowKey, i64>>,
    fail_reads: bool,
    fail_writes: bool,
    fail_purges: bool,
}

impl TestWindowRepo {
    fn lock_windows(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<WindowKey, i64>>> {
        self.windows
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock repo state: {error}")))
    }

    fn count_at(&self, window_start: DateTime<Utc>) -> i64 {
        self.lock_windows()
            .ok()
            .and_then(|windows| {
                windows
                    .iter()
                    .find(|((_, _, _, start), _)| *start == window_start)
                    .map(|(_, count)| *count)
            })
            .unwrap_or(0)
    }

    fn row_count(&self) -> usize {
        self.lock_windows().map(|windows| windows.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RateLimitWindowRepository for TestWindowRepo {
    async fn find_window(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<Option<RateLimitWindow>> {
        if self.fail_reads {
            return Err(AppError::Unavailable("storage offline".to_owned()));
        }

        let key = (
            identifier.to_owned(),
            identifier_kind,
            function_name.to_owned(),
            window_start,
        );
        Ok(self
            .lock_windows()?
            .get(&key)
            .map(|request_count| RateLimitWindow {
                identifier: identifier.to_owned(),
                identifier_kind,
                function_name: function_name.to_owned(),
                window_start,
                request_count: *request_count,
            }))
    }

    async fn record_call(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<i64> {
        if self.fail_writes {
            return Err(AppError::Unavailable("storage offline".to_owned()));
        }

        let key = (
            identifier.to_owned(),
            identifier_kind,
            function_name.to_owned(),
            window_start,
        );
        let mut windows = self.lock_windows()?;
        let count = windows.entry(key).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn purge_windows_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        if self.fail_purges {
            return Err(AppError::Unavailable("storage offline".to_owned()));
        }

        let mut windows = self.lock_windows()?;
        let before = windows.len();
        windows.retain(|(_, _, _, window_start), _| *window_start >= cutoff);
        Ok((before - windows.len()) as u64)
    }
}

fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, hour, minute, second)
        .single()
        .unwrap_or_default()
}

fn non_empty(value: &str) -> NonEmptyString {
    match NonEmptyString::new(value) {
        Ok(value) => value,
        Err(error) => panic!("invalid test value: {error}"),
    }
}

fn quota(per_minute: i64, per_hour: i64) -> QuotaConfig {
    match QuotaConfig::new(per_minute, per_hour) {
        Ok(quota) => quota,
        Err(error) => panic!("invalid test quota: {error}"),
    }
}

async fn check(
    service: &RateLimitService,
    quota: QuotaConfig,
    now: DateTime<Utc>,
) -> super::RateLimitDecision {
    service
        .check_and_record_at(
            &non_empty("u1"),
            IdentifierKind::User,
            &non_empty("f"),
            quota,
            now,
        )
        .await
}

#[tokio::test]
async fn minute_quota_admits_up_to_the_limit_and_rejects_the_next() {
    let repo = Arc::new(TestWindowRepo::default());
    let service = RateLimitService::new(repo.clone());
    let limits = quota(2, 10);

    let first = check(&service, limits, at(12, 30, 5)).await;
    let second = check(&service, limits, at(12, 30, 20)).await;
    let third = check(&service, limits, at(12, 30, 40)).await;

    assert!(first.allowed);
    assert!(second.allowed);
    assert!(!third.allowed);

    let retry_after = third.retry_after_seconds.unwrap_or(0);
    assert!((1..=60).contains(&retry_after));
    // 20 seconds remain in the 12:30 bucket at the time of the rejection.
    assert_eq!(retry_after, 20);
}

#[tokio::test]
async fn rejected_calls_are_not_recorded() {
    let repo = Arc::new(TestWindowRepo::default());
    let service = RateLimitService::new(repo.clone());
    let limits = quota(1, 10);

    assert!(check(&service, limits, at(12, 30, 5)).await.allowed);
    assert!(!check(&service, limits, at(12, 30, 20)).await.allowed);

    assert_eq!(repo.count_at(at(12, 30, 0)), 1);

    // The next minute bucket opens fresh; the hour bucket keeps counting.
    assert!(check(&service, limits, at(12, 31, 5)).await.allowed);
    assert_eq!(repo.count_at(at(12, 31, 0)), 1);
    assert_eq!(repo.count_at(at(12, 0, 0)), 2);
}

#[tokio::test]
async fn hourly_quota_rejects_even_when_every_minute_stays_under_its_limit() {
    let repo = Arc::new(TestWindowRepo::default());
    let service = RateLimitService::new(repo.clone());
    let limits = quota(2, 10);

    for call in 0..10 {
        let minute = 2 + call * 5;
        let decision = check(&service, limits, at(12, minute, 30)).await;
        assert!(decision.allowed, "call at minute {minute} should be admitted");
    }

    let eleventh = check(&service, limits, at(12, 58, 0)).await;
    assert!(!eleventh.allowed);
    // The hour bucket rolls over at 13:00, two minutes away.
    assert_eq!(eleventh.retry_after_seconds, Some(120));
}

#[tokio::test]
async fn minute_quota_rejects_even_when_the_hour_has_room() {
    let repo = Arc::new(TestWindowRepo::default());
    let service = RateLimitService::new(repo.clone());
    let limits = quota(1, 1_000);

    assert!(check(&service, limits, at(12, 30, 5)).await.allowed);
    let second = check(&service, limits, at(12, 30, 30)).await;
    assert!(!second.allowed);
    assert_eq!(second.retry_after_seconds, Some(30));
}

#[tokio::test]
async fn storage_failure_during_check_fails_open() {
    let repo = Arc::new(TestWindowRepo {
        fail_reads: true,
        ..TestWindowRepo::default()
    });
    let service = RateLimitService::new(repo);

    let decision = check(&service, quota(1, 1), at(12, 30, 5)).await;
    assert!(decision.allowed);
    assert_eq!(decision.retry_after_seconds, None);
}

#[tokio::test]
async fn storage_failure_during_record_fails_open() {
    let repo = Arc::new(TestWindowRepo {
        fail_writes: true,
        ..TestWindowRepo::default()
    });
    let service = RateLimitService::new(repo);

    let decision = check(&service, quota(1, 1), at(12, 30, 5)).await;
    assert!(decision.allowed);
}

#[tokio::test]
async fn purge_failure_does_not_abort_the_check() {
    let repo = Arc::new(TestWindowRepo {
        fail_purges: true,
        ..TestWindowRepo::default()
    });
    let service = RateLimitService::new(repo.clone());

    let decision = check(&service, quota(5, 50), at(12, 30, 5)).await;
    assert!(decision.allowed);
    assert_eq!(repo.count_at(at(12, 30, 0)), 1);
}

#[tokio::test]
async fn stale_windows_are_evicted_at_the_start_of_each_check() {
    let repo = Arc::new(TestWindowRepo::default());
    let service = RateLimitService::new(repo.clone());
    let limits = quota(5, 50);

    assert!(check(&service, limits, at(10, 15, 0)).await.allowed);
    assert_eq!(repo.row_count(), 2);

    // Both 10:xx buckets are past the hour horizon by 12:30.
    assert!(check(&service, limits, at(12, 30, 5)).await.allowed);
    assert_eq!(repo.row_count(), 2);
    assert_eq!(repo.count_at(at(10, 15, 0)), 0);
    assert_eq!(repo.count_at(at(10, 0, 0)), 0);
}

#[tokio::test]
async fn quota_config_rejects_non_positive_limits() {
    assert!(QuotaConfig::new(0, 10).is_err());
    assert!(QuotaConfig::new(10, 0).is_err());
    assert!(QuotaConfig::new(-1, 10).is_err());
    assert!(QuotaConfig::new(2, 10).is_ok());
}
