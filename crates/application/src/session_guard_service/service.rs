use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use gatewell_core::{AppError, AppResult, RequesterIdentity, UserId};
use gatewell_domain::SessionRecord;

use super::ports::{AuthSessionProvider, NewSession, SessionRepository};
use super::token_claims::session_id_from_token;

/// One session row returned by the listing.
#[derive(Debug, Clone)]
pub struct ListedSession {
    /// The bookkeeping row.
    pub record: SessionRecord,
    /// The auth subsystem's session id decoded from the token payload, when
    /// the payload decodes.
    pub session_id: Option<String>,
}

/// Result of listing a user's sessions.
#[derive(Debug, Clone)]
pub struct SessionListing {
    /// Sessions considered active. When `cross_check_available` is false
    /// these are the raw rows, unfiltered.
    pub active: Vec<ListedSession>,
    /// Whether the auth subsystem could be reached for the cross-reference.
    pub cross_check_available: bool,
    /// How many stale rows were deleted as a side effect of this listing.
    pub pruned_count: u64,
}

/// Application service guarding privileged operations behind session checks.
#[derive(Clone)]
pub struct SessionGuardService {
    sessions: Arc<dyn SessionRepository>,
    auth_provider: Arc<dyn AuthSessionProvider>,
}

impl SessionGuardService {
    /// Creates a new session guard service.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        auth_provider: Arc<dyn AuthSessionProvider>,
    ) -> Self {
        Self {
            sessions,
            auth_provider,
        }
    }

    /// Returns whether the credential maps to a non-revoked session row.
    ///
    /// Absence and storage failure both resolve to not-live: a revoked
    /// credential must never be admitted because the store happened to be
    /// unreachable. Expiry is checked separately against the auth subsystem.
    pub async fn is_session_live(&self, bearer_token: &str) -> bool {
        match self.sessions.find_by_token(bearer_token).await {
            Ok(record) => record.is_some(),
            Err(error) => {
                warn!(error = %error, "session liveness check failed closed");
                false
            }
        }
    }

    /// Resolves the requester identity behind a bearer credential.
    ///
    /// The credential must map to a non-revoked session row, and the auth
    /// subsystem must confirm it and name its user. Every failure resolves
    /// to a denial; the caller surfaces it as a generic authorization
    /// failure.
    pub async fn authenticate(&self, bearer_token: &str) -> AppResult<RequesterIdentity> {
        if !self.is_session_live(bearer_token).await {
            return Err(AppError::Unauthorized(
                "session is revoked or unknown".to_owned(),
            ));
        }

        match self.auth_provider.user_for_token(bearer_token).await {
            Ok(user) => Ok(RequesterIdentity::new(user.user_id, user.email, user.role)),
            Err(error) => {
                warn!(error = %error, "identity resolution failed, denying");
                Err(AppError::Unauthorized(
                    "credential could not be verified".to_owned(),
                ))
            }
        }
    }

    /// Persists a session row for a freshly issued credential.
    pub async fn register_session(&self, session: NewSession) -> AppResult<SessionRecord> {
        if session.session_token.trim().is_empty() {
            return Err(AppError::Validation(
                "session token must not be empty".to_owned(),
            ));
        }

        let now = Utc::now();
        if session.expires_at <= now {
            return Err(AppError::Validation(
                "session expiry must be in the future".to_owned(),
            ));
        }

        let record = SessionRecord {
            session_token: session.session_token,
            user_id: session.user_id,
            created_at: now,
            expires_at: session.expires_at,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
        };
        self.sessions.insert(&record).await?;
        Ok(record)
    }

    /// Deletes the session row for a credential, revoking it.
    ///
    /// Revoking an unknown token succeeds with a count of zero.
    pub async fn revoke_session(&self, session_token: &str) -> AppResult<u64> {
        let tokens = [session_token.to_owned()];
        self.sessions.delete_by_tokens(&tokens).await
    }

    /// Lists a user's currently-live sessions, pruning rows the two sources
    /// of truth prove stale.
    ///
    /// A row is active only when its token decodes, the decoded session id
    /// is confirmed live (and unexpired) by the auth subsystem, and the
    /// row's own expiry is in the future. When the subsystem is unreachable
    /// the raw rows are returned unfiltered with `cross_check_available`
    /// unset and nothing is pruned.
    pub async fn list_active_sessions(
        &self,
        user_id: UserId,
        requester: &RequesterIdentity,
    ) -> AppResult<SessionListing> {
        if !requester.can_act_for(user_id) {
            return Err(AppError::Forbidden(
                "cannot list sessions for another user".to_owned(),
            ));
        }

        let records = self.sessions.list_for_user(user_id).await?;

        let snapshots = match self.auth_provider.active_sessions_for_user(user_id).await {
            Ok(snapshots) => snapshots,
            Err(error) => {
                warn!(
                    user = %user_id,
                    error = %error,
                    "session cross-check unavailable, returning unfiltered rows"
                );
                let active = records
                    .into_iter()
                    .map(|record| ListedSession {
                        session_id: session_id_from_token(&record.session_token).ok(),
                        record,
                    })
                    .collect();
                return Ok(SessionListing {
                    active,
                    cross_check_available: false,
                    pruned_count: 0,
                });
            }
        };

        let now = Utc::now();
        let live_ids: HashSet<String> = snapshots
            .into_iter()
            .filter(|snapshot| !snapshot.is_expired(now))
            .map(|snapshot| snapshot.session_id)
            .collect();

        let mut active = Vec::new();
        let mut stale_tokens = Vec::new();
        for record in records {
            let decoded = session_id_from_token(&record.session_token);
            let confirmed = match &decoded {
                Ok(session_id) => live_ids.contains(session_id) && !record.is_expired(now),
                Err(error) => {
                    debug!(
                        user = %user_id,
                        error = %error,
                        "pruning session row with undecodable token"
                    );
                    false
                }
            };

            if confirmed {
                active.push(ListedSession {
                    session_id: decoded.ok(),
                    record,
                });
            } else {
                stale_tokens.push(record.session_token);
            }
        }

        let pruned_count = if stale_tokens.is_empty() {
            0
        } else {
            match self.sessions.delete_by_tokens(&stale_tokens).await {
                Ok(count) => count,
                Err(error) => {
                    // The listing itself succeeded; the next call retries
                    // the prune.
                    warn!(user = %user_id, error = %error, "stale session prune failed");
                    0
                }
            }
        };

        Ok(SessionListing {
            active,
            cross_check_available: true,
            pruned_count,
        })
    }
}
