//! PostgreSQL-backed rate limit window repository using the
//! `rate_limit_windows` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gatewell_application::RateLimitWindowRepository;
use gatewell_core::{AppError, AppResult};
use gatewell_domain::{IdentifierKind, RateLimitWindow};

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of the rate limit window repository port.
#[derive(Clone)]
pub struct PostgresRateLimitRepository {
    pool: PgPool,
}

impl PostgresRateLimitRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitWindowRepository for PostgresRateLimitRepository {
    async fn find_window(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<Option<RateLimitWindow>> {
        let row = sqlx::query_as::<_, WindowRow>(
            r#"
            SELECT identifier, identifier_kind, function_name, window_start, request_count
            FROM rate_limit_windows
            WHERE identifier = $1
              AND identifier_kind = $2
              AND function_name = $3
              AND window_start = $4
            "#,
        )
        .bind(identifier)
        .bind(identifier_kind.as_str())
        .bind(function_name)
        .bind(window_start)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to read rate limit window: {error}"))
        })?;

        row.map(WindowRow::into_window).transpose()
    }

    async fn record_call(
        &self,
        identifier: &str,
        identifier_kind: IdentifierKind,
        function_name: &str,
        window_start: DateTime<Utc>,
    ) -> AppResult<i64> {
        // UPSERT: insert the first call of the bucket or atomically bump the
        // counter. This is the only write path, so no transaction is needed.
        let (request_count,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO rate_limit_windows
                (identifier, identifier_kind, function_name, window_start, request_count)
            VALUES ($1, $2, $3, $4, 1)
            ON CONFLICT (identifier, identifier_kind, function_name, window_start)
            DO UPDATE SET request_count = rate_limit_windows.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(identifier)
        .bind(identifier_kind.as_str())
        .bind(function_name)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to record rate limit call: {error}"))
        })?;

        Ok(request_count)
    }

    async fn purge_windows_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limit_windows
            WHERE window_start < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to purge rate limit windows: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WindowRow {
    identifier: String,
    identifier_kind: String,
    function_name: String,
    window_start: DateTime<Utc>,
    request_count: i64,
}

impl WindowRow {
    fn into_window(self) -> AppResult<RateLimitWindow> {
        let identifier_kind = self.identifier_kind.parse::<IdentifierKind>().map_err(|_| {
            AppError::Internal(format!(
                "unknown identifier kind '{}' in rate_limit_windows",
                self.identifier_kind
            ))
        })?;

        Ok(RateLimitWindow {
            identifier: self.identifier,
            identifier_kind,
            function_name: self.function_name,
            window_start: self.window_start,
            request_count: self.request_count,
        })
    }
}
