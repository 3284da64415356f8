//! Gatewell API composition root.

#![forbid(unsafe_code)]

mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod quotas;
mod request_context;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use gatewell_application::{QuotaConfig, RateLimitService, SessionGuardService};
use gatewell_core::AppError;
use gatewell_infrastructure::{
    AuthProviderConfig, HttpAuthProvider, PostgresRateLimitRepository, PostgresSessionRepository,
};

use crate::quotas::portal_quotas;
use crate::request_context::TrustedProxies;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let frontend_url =
        env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    let internal_shared_secret = required_env("INTERNAL_SHARED_SECRET")?;
    if internal_shared_secret.len() < 32 {
        return Err(AppError::Validation(
            "INTERNAL_SHARED_SECRET must be at least 32 characters".to_owned(),
        ));
    }

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let auth_provider_url = Url::parse(required_env("AUTH_PROVIDER_URL")?.as_str())
        .map_err(|error| AppError::Validation(format!("invalid AUTH_PROVIDER_URL: {error}")))?;
    let auth_provider_service_key = required_env("AUTH_PROVIDER_SERVICE_KEY")?;
    let auth_provider_timeout_seconds = env::var("AUTH_PROVIDER_TIMEOUT_SECONDS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(10);

    let trusted_proxies = match env::var("TRUSTED_PROXY_NETWORKS") {
        Ok(spec) if !spec.trim().is_empty() => TrustedProxies::parse(spec.as_str())?,
        _ => TrustedProxies::default(),
    };

    let default_quota = QuotaConfig::new(
        env_i64("RATE_LIMIT_DEFAULT_PER_MINUTE", 30)?,
        env_i64("RATE_LIMIT_DEFAULT_PER_HOUR", 300)?,
    )?;
    let quotas = portal_quotas(default_quota)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let rate_limit_repository = Arc::new(PostgresRateLimitRepository::new(pool.clone()));
    let rate_limit_service = RateLimitService::new(rate_limit_repository);

    let session_repository = Arc::new(PostgresSessionRepository::new(pool.clone()));
    let auth_provider = Arc::new(HttpAuthProvider::new(AuthProviderConfig {
        base_url: auth_provider_url,
        service_key: auth_provider_service_key,
        request_timeout: Duration::from_secs(auth_provider_timeout_seconds),
    })?);
    let session_guard_service = SessionGuardService::new(session_repository, auth_provider);

    let app_state = AppState {
        rate_limit_service,
        session_guard_service,
        quotas: Arc::new(quotas),
        trusted_proxies: Arc::new(trusted_proxies),
        postgres_pool: pool,
        internal_shared_secret,
    };

    let router = api_router::build_router(app_state, frontend_url.as_str())?;

    let ip_address = IpAddr::from_str(api_host.as_str())
        .map_err(|error| AppError::Validation(format!("invalid API_HOST: {error}")))?;
    let address = SocketAddr::new(ip_address, api_port);
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "gatewell-api listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|error| AppError::Internal(format!("server error: {error}")))?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::Validation(format!("{name} environment variable is required")))
}

fn env_i64(name: &str, default: i64) -> Result<i64, AppError> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<i64>().map_err(|error| {
            AppError::Validation(format!("invalid {name}: {error}"))
        }),
        Err(_) => Ok(default),
    }
}
