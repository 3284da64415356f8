//! Gatewell housekeeping worker.
//!
//! Periodically purges rate limit windows past the hour horizon and session
//! rows past their own expiry. Both deletions are idempotent, so several
//! workers may run against the same store.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gatewell_application::{RateLimitService, SessionRepository};
use gatewell_core::{AppError, AppResult};
use gatewell_infrastructure::{PostgresRateLimitRepository, PostgresSessionRepository};

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    poll_interval_ms: u64,
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            AppError::Validation("DATABASE_URL environment variable is required".to_owned())
        })?;
        let poll_interval_ms = env::var("CLEANUP_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(300_000);

        Ok(Self {
            database_url,
            poll_interval_ms,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;

    let rate_limit_service =
        RateLimitService::new(Arc::new(PostgresRateLimitRepository::new(pool.clone())));
    let session_repository = PostgresSessionRepository::new(pool);

    info!(
        poll_interval_ms = config.poll_interval_ms,
        "gatewell-worker started"
    );

    loop {
        match rate_limit_service.cleanup().await {
            Ok(purged) if purged > 0 => info!(purged, "purged stale rate limit windows"),
            Ok(_) => {}
            Err(error) => warn!(error = %error, "rate limit window cleanup failed"),
        }

        match session_repository.purge_expired(Utc::now()).await {
            Ok(purged) if purged > 0 => info!(purged, "purged expired session rows"),
            Ok(_) => {}
            Err(error) => warn!(error = %error, "session purge failed"),
        }

        tokio::time::sleep(Duration::from_millis(config.poll_interval_ms)).await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
