//! HTTP adapter for the auth subsystem's session and identity lookups.
//!
//! The subsystem is authoritative but fallible; every failure is reported in
//! the application error taxonomy and the services decide whether it
//! degrades or denies.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use gatewell_application::{AuthSessionProvider, AuthenticatedUser};
use gatewell_core::{AppError, AppResult, PortalRole, UserId};
use gatewell_domain::AuthSessionSnapshot;

/// Configuration for the auth subsystem client.
#[derive(Debug, Clone)]
pub struct AuthProviderConfig {
    /// Base URL of the auth subsystem's API.
    pub base_url: Url,
    /// Service credential authorizing admin session lookups.
    pub service_key: String,
    /// Per-request timeout; doubles as the effective storage-call deadline.
    pub request_timeout: Duration,
}

/// Reqwest-based implementation of the auth session provider port.
#[derive(Clone)]
pub struct HttpAuthProvider {
    client: reqwest::Client,
    base_url: Url,
    service_key: String,
}

impl HttpAuthProvider {
    /// Creates a provider with a configured HTTP client.
    pub fn new(config: AuthProviderConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build auth provider client: {error}"))
            })?;

        // `Url::join` drops the last path segment unless the base ends in a
        // slash.
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            service_key: config.service_key,
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid auth provider endpoint '{path}': {error}"))
        })
    }
}

#[async_trait]
impl AuthSessionProvider for HttpAuthProvider {
    async fn active_sessions_for_user(
        &self,
        user_id: UserId,
    ) -> AppResult<Vec<AuthSessionSnapshot>> {
        let url = self.endpoint(&format!("admin/users/{user_id}/sessions"))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("auth subsystem unreachable: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unavailable(format!(
                "auth subsystem returned {} for session lookup",
                response.status()
            )));
        }

        let payload: SessionsResponse = response.json().await.map_err(|error| {
            AppError::Unavailable(format!("invalid auth subsystem session payload: {error}"))
        })?;

        Ok(payload
            .sessions
            .into_iter()
            .map(|session| AuthSessionSnapshot {
                session_id: session.id,
                expires_at: session.expires_at,
            })
            .collect())
    }

    async fn user_for_token(&self, bearer_token: &str) -> AppResult<AuthenticatedUser> {
        let url = self.endpoint("user")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("auth subsystem unreachable: {error}"))
            })?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(AppError::Unauthorized(
                "credential rejected by the auth subsystem".to_owned(),
            ));
        }

        if !response.status().is_success() {
            return Err(AppError::Unavailable(format!(
                "auth subsystem returned {} for identity lookup",
                response.status()
            )));
        }

        let payload: UserResponse = response.json().await.map_err(|error| {
            AppError::Unavailable(format!("invalid auth subsystem user payload: {error}"))
        })?;

        let user_id = UserId::parse(&payload.id).map_err(|error| {
            AppError::Internal(format!("auth subsystem returned an invalid user id: {error}"))
        })?;

        let role = match payload.role.as_deref() {
            Some("admin") => PortalRole::Admin,
            _ => PortalRole::Member,
        };

        Ok(AuthenticatedUser {
            user_id,
            email: payload.email,
            role,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    email: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    sessions: Vec<SessionSnapshotResponse>,
}

#[derive(Debug, Deserialize)]
struct SessionSnapshotResponse {
    id: String,
    expires_at: Option<DateTime<Utc>>,
}
