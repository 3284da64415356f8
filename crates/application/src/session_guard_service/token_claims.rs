//! Bearer token payload decoding.
//!
//! The auth subsystem issues JWT-shaped tokens whose payload carries the
//! subsystem's session identifier as a nested sub-claim. The guard only
//! mines that identifier for cross-referencing; signature verification
//! remains the subsystem's job.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use gatewell_core::{AppError, AppResult};

#[derive(Debug, Deserialize)]
struct TokenClaims {
    session: SessionClaim,
}

#[derive(Debug, Deserialize)]
struct SessionClaim {
    id: String,
}

/// Extracts the auth subsystem's session id from a bearer token payload.
///
/// Fails with a validation error on any malformed input; callers treat that
/// as "this credential is stale", never as a fatal condition.
pub fn session_id_from_token(bearer_token: &str) -> AppResult<String> {
    let segments: Vec<&str> = bearer_token.split('.').collect();
    if segments.len() != 3 {
        return Err(AppError::Validation(
            "bearer token is not in header.payload.signature form".to_owned(),
        ));
    }

    let payload = URL_SAFE_NO_PAD.decode(segments[1]).map_err(|error| {
        AppError::Validation(format!("bearer token payload is not base64url: {error}"))
    })?;

    let claims: TokenClaims = serde_json::from_slice(&payload).map_err(|error| {
        AppError::Validation(format!("bearer token payload is not claims JSON: {error}"))
    })?;

    if claims.session.id.trim().is_empty() {
        return Err(AppError::Validation(
            "bearer token session id claim is empty".to_owned(),
        ));
    }

    Ok(claims.session.id)
}
