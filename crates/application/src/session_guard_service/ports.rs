use async_trait::async_trait;
use chrono::{DateTime, Utc};

use gatewell_core::{AppResult, PortalRole, UserId};
use gatewell_domain::{AuthSessionSnapshot, SessionRecord};

/// Input payload for registering a session at login.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// The freshly issued bearer credential.
    pub session_token: String,
    /// Owner of the session.
    pub user_id: UserId,
    /// When the credential expires on its own.
    pub expires_at: DateTime<Utc>,
    /// Client IP captured at login, if known.
    pub ip_address: Option<String>,
    /// Client user agent captured at login, if known.
    pub user_agent: Option<String>,
}

/// Repository port for session bookkeeping rows.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session row by exact token match.
    async fn find_by_token(&self, session_token: &str) -> AppResult<Option<SessionRecord>>;

    /// Lists all session rows for a user, newest first.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<SessionRecord>>;

    /// Inserts a session row at login.
    async fn insert(&self, record: &SessionRecord) -> AppResult<()>;

    /// Deletes session rows by token, returning how many existed.
    ///
    /// Tokens with no matching row are not an error: concurrent pruning may
    /// already have removed them.
    async fn delete_by_tokens(&self, session_tokens: &[String]) -> AppResult<u64>;

    /// Deletes rows whose own expiry has passed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Identity resolved by the auth subsystem from a bearer credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Email on record, if any.
    pub email: Option<String>,
    /// Portal role claimed for the user.
    pub role: PortalRole,
}

/// Port for the auth subsystem's session and identity records.
///
/// Both calls are authoritative but fallible external calls; callers decide
/// per operation whether a failure degrades or denies.
#[async_trait]
pub trait AuthSessionProvider: Send + Sync {
    /// Fetches the subsystem's live sessions for a user.
    async fn active_sessions_for_user(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<AuthSessionSnapshot>>;

    /// Resolves the user behind a bearer credential.
    async fn user_for_token(&self, bearer_token: &str) -> AppResult<AuthenticatedUser>;
}
