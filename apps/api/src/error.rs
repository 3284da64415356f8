use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};
use ts_rs::TS;

use gatewell_core::AppError;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/portal-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<i64>,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Throttled {
                retry_after_seconds,
            } => {
                let payload = Json(ErrorResponse {
                    error: "Rate limit exceeded".to_owned(),
                    retry_after: Some(retry_after_seconds),
                });
                let mut response = (StatusCode::TOO_MANY_REQUESTS, payload).into_response();
                if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                response
            }
            // Denials are uniform: whether a credential was revoked,
            // malformed, or never issued is not distinguishable from outside.
            AppError::Unauthorized(_) => plain_error(StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Forbidden(_) => plain_error(StatusCode::FORBIDDEN, "Forbidden"),
            AppError::Validation(message) => {
                let payload = Json(ErrorResponse {
                    error: message,
                    retry_after: None,
                });
                (StatusCode::BAD_REQUEST, payload).into_response()
            }
            AppError::Unavailable(message) => {
                warn!(detail = %message, "dependency unavailable");
                plain_error(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable",
                )
            }
            AppError::Internal(message) => {
                error!(detail = %message, "internal error");
                plain_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

fn plain_error(status: StatusCode, message: &str) -> Response {
    let payload = Json(ErrorResponse {
        error: message.to_owned(),
        retry_after: None,
    });
    (status, payload).into_response()
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;

    use gatewell_core::AppError;

    use super::ApiError;

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        String::from_utf8(bytes.to_vec()).unwrap_or_default()
    }

    #[tokio::test]
    async fn throttled_maps_to_429_with_retry_after_header_and_body() {
        let response = ApiError(AppError::Throttled {
            retry_after_seconds: 37,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("37")
        );

        let body = body_text(response).await;
        assert!(body.contains("\"error\":\"Rate limit exceeded\""));
        assert!(body.contains("\"retry_after\":37"));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_a_generic_401() {
        let response =
            ApiError(AppError::Unauthorized("token was revoked yesterday".to_owned()))
                .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_text(response).await;
        assert!(body.contains("\"error\":\"Unauthorized\""));
        // The reason for the denial must not leak.
        assert!(!body.contains("revoked"));
    }

    #[tokio::test]
    async fn unavailable_maps_to_a_generic_503() {
        let response = ApiError(AppError::Unavailable(
            "postgres connection pool timed out".to_owned(),
        ))
        .into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_text(response).await;
        assert!(!body.contains("postgres"));
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_the_message() {
        let response =
            ApiError(AppError::Validation("identifier must not be empty".to_owned()))
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_text(response).await;
        assert!(body.contains("identifier must not be empty"));
    }
}
