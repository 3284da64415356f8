use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use gatewell_application::QuotaConfig;
use gatewell_core::{AppError, NonEmptyString, RequesterIdentity};
use gatewell_domain::IdentifierKind;

use crate::error::ApiResult;
use crate::request_context::{bearer_token, client_ip};
use crate::state::AppState;

/// Quota attached to a route group and keyed by client IP.
#[derive(Clone)]
pub struct IpRouteQuota {
    pub function_name: NonEmptyString,
    pub quota: QuotaConfig,
}

/// Quota attached to a route group and keyed by the authenticated user.
#[derive(Clone)]
pub struct UserRouteQuota {
    pub function_name: NonEmptyString,
    pub quota: QuotaConfig,
}

/// Rejects internal calls without the shared deployment secret.
pub async fn require_internal_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let presented = request
        .headers()
        .get("x-internal-token")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if presented.is_empty() || presented != state.internal_shared_secret {
        return Err(AppError::Unauthorized("internal secret mismatch".to_owned()).into());
    }

    Ok(next.run(request).await)
}

/// Resolves the bearer credential into a requester identity.
///
/// The session guard fails closed: revoked, unknown, and unverifiable
/// credentials are all denied with the same generic response.
pub async fn require_live_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())?.to_owned();
    let identity = state.session_guard_service.authenticate(&token).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Applies the route group's quota against the client IP.
///
/// Runs before authentication so unauthenticated probing is throttled too.
pub async fn rate_limit_by_ip(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let rule = request
        .extensions()
        .get::<IpRouteQuota>()
        .cloned()
        .ok_or_else(|| AppError::Internal("route is missing its IP quota rule".to_owned()))?;

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let identifier = match peer {
        Some(peer) => client_ip(request.headers(), peer, &state.trusted_proxies).to_string(),
        None => "unknown-peer".to_owned(),
    };
    let identifier = NonEmptyString::new(identifier)?;

    let decision = state
        .rate_limit_service
        .check_and_record(
            &identifier,
            IdentifierKind::Ip,
            &rule.function_name,
            rule.quota,
        )
        .await;

    if !decision.allowed {
        return Err(AppError::Throttled {
            retry_after_seconds: decision.retry_after_seconds.unwrap_or(1),
        }
        .into());
    }

    Ok(next.run(request).await)
}

/// Applies the route group's quota against the authenticated user.
///
/// Must run inside `require_live_session`, which inserts the identity.
pub async fn rate_limit_by_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let rule = request
        .extensions()
        .get::<UserRouteQuota>()
        .cloned()
        .ok_or_else(|| AppError::Internal("route is missing its user quota rule".to_owned()))?;

    let identity = request
        .extensions()
        .get::<RequesterIdentity>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let identifier = NonEmptyString::new(identity.user_id().to_string())?;

    let decision = state
        .rate_limit_service
        .check_and_record(
            &identifier,
            IdentifierKind::User,
            &rule.function_name,
            rule.quota,
        )
        .await;

    if !decision.allowed {
        return Err(AppError::Throttled {
            retry_after_seconds: decision.retry_after_seconds.unwrap_or(1),
        }
        .into());
    }

    Ok(next.run(request).await)
}
