use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatewell_core::AppResult;
use gatewell_domain::{IdentifierKind, RateLimitWindow};

/// Repository port for rate limit window persistence.
#[async_trait]
pub trait RateLimitWindowRepository: Send + Sync {
    /// Reads the window row for one exact bucket, if present.
    async fn find_window(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<Option<RateLimitWindow>>;

    /// Records one call in the given bucket.
    ///
    /// Uses an UPSERT pattern: inserts the row with a count of one or
    /// atomically increments the existing count. Returns the updated count.
    /// Two concurrent callers may both pass the preceding checks and both
    /// land here; the resulting overshoot is accepted.
    async fn record_call(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<i64>;

    /// Removes window rows whose bucket started before the cutoff.
    async fn purge_windows_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
