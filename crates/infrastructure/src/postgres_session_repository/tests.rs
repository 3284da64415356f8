use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gatewell_application::SessionRepository;
use gatewell_core::UserId;
use gatewell_domain::SessionRecord;

use super::PostgresSessionRepository;

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
        panic!("failed to run migrations for session tests: {error}");
    }

    Some(pool)
}

fn record(user_id: UserId, expires_in: Duration) -> SessionRecord {
    SessionRecord {
        session_token: format!("token-{}", Uuid::new_v4()),
        user_id,
        created_at: Utc::now(),
        expires_at: Utc::now() + expires_in,
        ip_address: Some("198.51.100.7".to_owned()),
        user_agent: Some("integration-test".to_owned()),
    }
}

#[tokio::test]
async fn insert_find_and_delete_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSessionRepository::new(pool);
    let session = record(UserId::new(), Duration::hours(1));

    assert!(repository.insert(&session).await.is_ok());

    let found = repository.find_by_token(&session.session_token).await;
    let Ok(Some(found)) = found else {
        panic!("expected the inserted session row to be found");
    };
    assert_eq!(found.user_id, session.user_id);

    let deleted = repository
        .delete_by_tokens(&[session.session_token.clone()])
        .await;
    assert_eq!(deleted.ok(), Some(1));

    let gone = repository.find_by_token(&session.session_token).await;
    assert_eq!(gone.ok().flatten(), None);
}

#[tokio::test]
async fn listing_returns_only_the_requested_users_rows_newest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSessionRepository::new(pool);
    let user_id = UserId::new();
    let other_user = UserId::new();

    let mut older = record(user_id, Duration::hours(1));
    older.created_at = Utc::now() - Duration::minutes(30);
    let newer = record(user_id, Duration::hours(1));
    let foreign = record(other_user, Duration::hours(1));

    for session in [&older, &newer, &foreign] {
        assert!(repository.insert(session).await.is_ok());
    }

    let listed = repository.list_for_user(user_id).await;
    let Ok(listed) = listed else {
        panic!("expected the listing to succeed");
    };

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].session_token, newer.session_token);
    assert_eq!(listed[1].session_token, older.session_token);
}

#[tokio::test]
async fn deleting_unknown_tokens_reports_zero_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSessionRepository::new(pool);
    let deleted = repository
        .delete_by_tokens(&[format!("token-{}", Uuid::new_v4())])
        .await;
    assert_eq!(deleted.ok(), Some(0));
}

#[tokio::test]
async fn purge_expired_removes_only_past_expiry_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresSessionRepository::new(pool);
    let user_id = UserId::new();
    let live = record(user_id, Duration::hours(1));
    let expired = record(user_id, Duration::seconds(-60));

    for session in [&live, &expired] {
        assert!(repository.insert(session).await.is_ok());
    }

    let purged = repository.purge_expired(Utc::now()).await;
    assert!(purged.ok().is_some_and(|count| count >= 1));

    assert_eq!(
        repository
            .find_by_token(&expired.session_token)
            .await
            .ok()
            .flatten(),
        None
    );
    assert!(
        repository
            .find_by_token(&live.session_token)
            .await
            .ok()
            .flatten()
            .is_some()
    );
}
