//! Wire payloads shared with the browser components and internal callers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use gatewell_application::{ListedSession, SessionListing};

/// Admission check request from an out-of-process serverless function.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/admission-check-request.ts"
)]
pub struct AdmissionCheckRequest {
    /// User id or client IP the quota is tracked against.
    pub identifier: String,
    /// Either `"user"` or `"ip"`.
    pub identifier_kind: String,
    /// Name of the protected function.
    pub function_name: String,
    /// Bearer credential to check against the session guard, when present.
    pub bearer_token: Option<String>,
}

/// Session registration payload from the login handler.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/register-session-request.ts"
)]
pub struct RegisterSessionRequest {
    pub session_token: String,
    pub user_id: String,
    /// RFC 3339 timestamp.
    pub expires_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Revocation payload naming the credential to delete.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/revoke-session-request.ts"
)]
pub struct RevokeSessionRequest {
    pub session_token: String,
}

/// One session in a listing. The raw credential is never exposed.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    /// The auth subsystem's session id, when the token payload decodes.
    pub session_id: Option<String>,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp.
    pub expires_at: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl SessionResponse {
    fn from_listed(listed: ListedSession) -> Self {
        Self {
            session_id: listed.session_id,
            created_at: listed.record.created_at.to_rfc3339(),
            expires_at: listed.record.expires_at.to_rfc3339(),
            ip_address: listed.record.ip_address,
            user_agent: listed.record.user_agent,
        }
    }
}

/// Listing of a user's live sessions.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/session-list-response.ts"
)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
    /// False when the auth subsystem could not be reached and the list is
    /// unfiltered.
    pub cross_check_available: bool,
    /// Stale rows deleted as a side effect of this listing.
    pub pruned_count: u64,
}

impl SessionListResponse {
    pub fn from_listing(listing: SessionListing) -> Self {
        Self {
            sessions: listing
                .active
                .into_iter()
                .map(SessionResponse::from_listed)
                .collect(),
            cross_check_available: listing.cross_check_available,
            pruned_count: listing.pruned_count,
        }
    }
}

/// Generic status payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/generic-message-response.ts"
)]
pub struct GenericMessageResponse {
    pub message: String,
}

/// Liveness payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Readiness payload with the database probe outcome.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/ready-response.ts"
)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub database: &'static str,
}
