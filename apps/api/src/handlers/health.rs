use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::{HealthResponse, ReadyResponse};
use crate::state::AppState;

/// GET /api/health/live - process liveness.
pub async fn live_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /api/health/ready - readiness including a database probe.
pub async fn ready_handler(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let check = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.postgres_pool)
        .await;

    match check {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(error) => {
            warn!(error = %error, "database readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "degraded",
                    database: "error",
                }),
            )
        }
    }
}
