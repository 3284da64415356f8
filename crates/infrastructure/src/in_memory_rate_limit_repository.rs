//! In-memory rate limit window repository for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatewell_application::RateLimitWindowRepository;
use gatewell_core::{AppError, AppResult};
use gatewell_domain::{IdentifierKind, RateLimitWindow};

type WindowKey = (String, IdentifierKind, String, DateTime<Utc>);

/// Mutex-guarded map standing in for the `rate_limit_windows` table.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    windows: Mutex<HashMap<WindowKey, i64>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_windows(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<WindowKey, i64>>> {
        self.windows
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock window state: {error}")))
    }
}

#[async_trait]
impl RateLimitWindowRepository for InMemoryRateLimitRepository {
    async fn find_window(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<Option<RateLimitWindow>> {
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
        let mut windows = self.lock_windows()?;
        let before = windows.len();
        windows.retain(|(_, _, _, window_start), _| *window_start >= cutoff);
        Ok((before - windows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use gatewell_application::RateLimitWindowRepository;
    use gatewell_domain::{IdentifierKind, WindowGranularity};

    use super::InMemoryRateLimitRepository;

    #[tokio::test]
    async fn record_and_purge_behave_like_the_table() {
        let repository = InMemoryRateLimitRepository::new();
        let window_start = WindowGranularity::Minute.truncate(Utc::now());

        let first = repository
            .record_call("u1", IdentifierKind::User, "f", window_start)
            .await;
        let second = repository
            .record_call("u1", IdentifierKind::User, "f", window_start)
            .await;
        assert_eq!(first.ok(), Some(1));
        assert_eq!(second.ok(), Some(2));

        let purged = repository
            .purge_windows_before(window_start + Duration::minutes(1))
            .await;
        assert_eq!(purged.ok(), Some(1));

        let window = repository
            .find_window("u1", IdentifierKind::User, "f", window_start)
            .await;
        assert_eq!(window.ok().flatten(), None);
    }
}
