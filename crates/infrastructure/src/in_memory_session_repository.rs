//! In-memory session repository for tests and local development.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatewell_application::SessionRepository;
use gatewell_core::{AppError, AppResult, UserId};
use gatewell_domain::SessionRecord;

/// Mutex-guarded map standing in for the `portal_sessions` table.
#[derive(Default)]
pub struct InMemorySessionRepository {
    records: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_records(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, SessionRecord>>> {
        self.records
            .lock()
            .map_err(|error| AppError::Internal(format!("failed to lock session state: {error}")))
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_token(&self, session_token: &str) -> AppResult<Option<SessionRecord>> {
        Ok(self.lock_records()?.get(session_token).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>> {
        let mut records: Vec<SessionRecord> = self
            .lock_records()?
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn insert(&self, record: &SessionRecord) -> AppResult<()> {
        self.lock_records()?
            .insert(record.session_token.clone(), record.clone());
        Ok(())
    }

    async fn delete_by_tokens(&self, session_tokens: &[String]) -> AppResult<u64> {
        let mut records = self.lock_records()?;
        let mut deleted = 0;
        for token in session_tokens {
            if records.remove(token).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut records = self.lock_records()?;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok((before - records.len()) as u64)
    }
}
