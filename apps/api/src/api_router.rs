use axum::Router;
use axum::extract::Extension;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use gatewell_core::{AppError, NonEmptyString};

use crate::middleware::{IpRouteQuota, UserRouteQuota};
use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_origin = frontend_url
        .parse::<HeaderValue>()
        .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL for CORS: {error}")))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true);

    let internal_routes = Router::new()
        .route(
            "/api/internal/admission/check",
            post(handlers::admission::admission_check_handler),
        )
        .route(
            "/api/internal/sessions",
            post(handlers::sessions::register_session_handler)
                .delete(handlers::sessions::revoke_session_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_internal_secret,
        ));

    let ip_quota = IpRouteQuota {
        function_name: NonEmptyString::new("session_api")?,
        quota: app_state.quotas.quota_for("session_api"),
    };
    let user_quota = UserRouteQuota {
        function_name: NonEmptyString::new("manage_sessions")?,
        quota: app_state.quotas.quota_for("manage_sessions"),
    };

    let session_routes = Router::new()
        .route(
            "/api/sessions",
            get(handlers::sessions::list_my_sessions_handler),
        )
        .route(
            "/api/sessions/current",
            delete(handlers::sessions::revoke_current_session_handler),
        )
        .route(
            "/api/users/{user_id}/sessions",
            get(handlers::sessions::list_user_sessions_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit_by_user,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_live_session,
        ))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::rate_limit_by_ip,
        ))
        .layer(Extension(user_quota))
        .layer(Extension(ip_quota));

    let health_routes = Router::new()
        .route("/api/health/live", get(handlers::health::live_handler))
        .route("/api/health/ready", get(handlers::health::ready_handler));

    Ok(Router::new()
        .merge(internal_routes)
        .merge(session_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
