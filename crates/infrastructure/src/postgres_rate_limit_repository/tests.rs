use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gatewell_application::RateLimitWindowRepository;
use gatewell_domain::{IdentifierKind, WindowGranularity};

use super::PostgresRateLimitRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for rate limit tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn record_call_inserts_then_increments_one_bucket() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRateLimitRepository::new(pool);
    let identifier = format!("user-{}", Uuid::new_v4());
    let function_name = "send_contact_email";
    let window_start = WindowGranularity::Minute.truncate(Utc::now());

    let first = repository
        .record_call(&identifier, IdentifierKind::User, function_name, window_start)
        .await;
    let second = repository
        .record_call(&identifier, IdentifierKind::User, function_name, window_start)
        .await;

    assert_eq!(first.ok(), Some(1));
    assert_eq!(second.ok(), Some(2));

    let window = repository
        .find_window(&identifier, IdentifierKind::User, function_name, window_start)
        .await;
    let Ok(Some(window)) = window else {
        panic!("expected a window row after two recorded calls");
    };
    assert_eq!(window.request_count, 2);
    assert_eq!(window.identifier_kind, IdentifierKind::User);
}

#[tokio::test]
async fn buckets_are_isolated_by_window_start() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRateLimitRepository::new(pool);
    let identifier = format!("ip-{}", Uuid::new_v4());
    let function_name = "provision_product";
    let minute_start = WindowGranularity::Minute.truncate(Utc::now());
    let hour_start = WindowGranularity::Hour.truncate(Utc::now());

    let recorded = repository
        .record_call(&identifier, IdentifierKind::Ip, function_name, minute_start)
        .await;
    assert!(recorded.is_ok());

    if hour_start != minute_start {
        let other_bucket = repository
            .find_window(&identifier, IdentifierKind::Ip, function_name, hour_start)
            .await;
        assert_eq!(other_bucket.ok().flatten(), None);
    }
}

#[tokio::test]
async fn purge_removes_only_rows_before_the_cutoff() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresRateLimitRepository::new(pool);
    let identifier = format!("user-{}", Uuid::new_v4());
    let function_name = "export_account";
    let now = Utc::now();
    let fresh = WindowGranularity::Minute.truncate(now);
    let stale = fresh - Duration::hours(3);

    for window_start in [fresh, stale] {
        let recorded = repository
            .record_call(&identifier, IdentifierKind::User, function_name, window_start)
            .await;
        assert!(recorded.is_ok());
    }

    let purged = repository
        .purge_windows_before(now - WindowGranularity::Hour.duration())
        .await;
    assert!(purged.ok().is_some_and(|count| count >= 1));

    let stale_window = repository
        .find_window(&identifier, IdentifierKind::User, function_name, stale)
        .await;
    assert_eq!(stale_window.ok().flatten(), None);

    let fresh_window = repository
        .find_window(&identifier, IdentifierKind::User, function_name, fresh)
        .await;
    assert!(fresh_window.ok().flatten().is_some());
}
