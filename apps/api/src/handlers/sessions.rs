use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gatewell_application::NewSession;
use gatewell_core::{AppError, RequesterIdentity, UserId};

use crate::dto::{
    GenericMessageResponse, RegisterSessionRequest, RevokeSessionRequest, SessionListResponse,
};
use crate::error::ApiResult;
use crate::request_context::bearer_token;
use crate::state::AppState;

/// POST /api/internal/sessions - called by the login handler once the auth
/// subsystem has issued a credential.
pub async fn register_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<RegisterSessionRequest>,
) -> ApiResult<(StatusCode, Json<GenericMessageResponse>)> {
    let user_id = UserId::parse(&payload.user_id)?;
    let expires_at = parse_timestamp(&payload.expires_at)?;

    state
        .session_guard_service
        .register_session(NewSession {
            session_token: payload.session_token,
            user_id,
            expires_at,
            ip_address: payload.ip_address,
            user_agent: payload.user_agent,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(GenericMessageResponse {
            message: "session registered".to_owned(),
        }),
    ))
}

/// DELETE /api/internal/sessions - logout or admin revocation by token.
pub async fn revoke_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<RevokeSessionRequest>,
) -> ApiResult<StatusCode> {
    state
        .session_guard_service
        .revoke_session(&payload.session_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/sessions - the caller's own live sessions, pruning stale rows.
pub async fn list_my_sessions_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<RequesterIdentity>,
) -> ApiResult<Json<SessionListResponse>> {
    let listing = state
        .session_guard_service
        .list_active_sessions(identity.user_id(), &identity)
        .await?;

    Ok(Json(SessionListResponse::from_listing(listing)))
}

/// GET /api/users/{user_id}/sessions - another user's sessions; the guard
/// enforces the elevated-role requirement.
pub async fn list_user_sessions_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<RequesterIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<SessionListResponse>> {
    let listing = state
        .session_guard_service
        .list_active_sessions(UserId::from_uuid(user_id), &identity)
        .await?;

    Ok(Json(SessionListResponse::from_listing(listing)))
}

/// DELETE /api/sessions/current - revoke the presented credential.
pub async fn revoke_current_session_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers)?;
    state.session_guard_service.revoke_session(token).await?;

    Ok(StatusCode::NO_CONTENT)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| AppError::Validation(format!("invalid RFC 3339 timestamp: {error}")))
}
