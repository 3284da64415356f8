use std::sync::Arc;

use sqlx::PgPool;

use gatewell_application::{RateLimitService, SessionGuardService};

use crate::quotas::QuotaRegistry;
use crate::request_context::TrustedProxies;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub rate_limit_service: RateLimitService,
    pub session_guard_service: SessionGuardService,
    pub quotas: Arc<QuotaRegistry>,
    pub trusted_proxies: Arc<TrustedProxies>,
    pub postgres_pool: PgPool,
    pub internal_shared_secret: String,
}
