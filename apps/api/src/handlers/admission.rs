use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use gatewell_core::{AppError, NonEmptyString};
use gatewell_domain::IdentifierKind;

use crate::dto::AdmissionCheckRequest;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/internal/admission/check - session guard + dual-window limiter
/// for out-of-process serverless callers.
pub async fn admission_check_handler(
    State(state): State<AppState>,
    Json(payload): Json<AdmissionCheckRequest>,
) -> ApiResult<StatusCode> {
    // Guard first: a revoked credential is denied before it touches quota.
    if let Some(bearer_token) = payload.bearer_token.as_deref()
        && !state.session_guard_service.is_session_live(bearer_token).await
    {
        return Err(AppError::Unauthorized("session is revoked or unknown".to_owned()).into());
    }

    let identifier = NonEmptyString::new(payload.identifier)?;
    let function_name = NonEmptyString::new(payload.function_name)?;
    let identifier_kind: IdentifierKind = payload.identifier_kind.parse()?;

    let quota = state.quotas.quota_for(function_name.as_str());
    let decision = state
        .rate_limit_service
        .check_and_record(&identifier, identifier_kind, &function_name, quota)
        .await;

    if !decision.allowed {
        return Err(AppError::Throttled {
            retry_after_seconds: decision.retry_after_seconds.unwrap_or(1),
        }
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}
