//! PostgreSQL-backed session repository using the `portal_sessions` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use gatewell_application::SessionRepository;
use gatewell_core::{AppError, AppResult, UserId};
use gatewell_domain::SessionRecord;

#[cfg(test)]
mod tests;

/// PostgreSQL implementation of the session repository port.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn find_by_token(&self, session_token: &str) -> AppResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_token, user_id, created_at, expires_at, ip_address, user_agent
            FROM portal_sessions
            WHERE session_token = $1
            "#,
        )
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to read session row: {error}")))?;

        Ok(row.map(SessionRow::into_record))
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_token, user_id, created_at, expires_at, ip_address, user_agent
            FROM portal_sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to list session rows: {error}"))
        })?;

        Ok(rows.into_iter().map(SessionRow::into_record).collect())
    }

    async fn insert(&self, record: &SessionRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO portal_sessions
                (session_token, user_id, created_at, expires_at, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.session_token.as_str())
        .bind(record.user_id.as_uuid())
        .bind(record.created_at)
        .bind(record.expires_at)
        .bind(record.ip_address.as_deref())
        .bind(record.user_agent.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to insert session row: {error}"))
        })?;

        Ok(())
    }

    async fn delete_by_tokens(&self, session_tokens: &[String]) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM portal_sessions
            WHERE session_token = ANY($1)
            "#,
        )
        .bind(session_tokens)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to delete session rows: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM portal_sessions
            WHERE expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Unavailable(format!("failed to purge expired sessions: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    session_token: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl SessionRow {
    fn into_record(self) -> SessionRecord {
        SessionRecord {
            session_token: self.session_token,
            user_id: UserId::from_uuid(self.user_id),
            created_at: self.created_at,
            expires_at: self.expires_at,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        }
    }
}
