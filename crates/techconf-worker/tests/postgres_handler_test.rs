//! Handler tests against a real PostgreSQL database.
//!
//! The database tests are ignored by default. Run them with
//! `TEST_POSTGRES_HOST` (and optionally `TEST_POSTGRES_PORT`, `TEST_POSTGRES_USER`,
//! `TEST_POSTGRES_PASSWORD`, `TEST_POSTGRES_DB`) pointing at a scratch database:
//!
//! ```text
//! cargo test -p techconf-worker --test postgres_handler_test -- --ignored --test-threads=1
//! ```

use std::env;
use std::sync::Arc;

use chrono::Utc;
use sqlx::{Connection, PgConnection};
use techconf_core::DatabaseConfig;
use techconf_db::{connect_options, NotificationRepository, PgNotificationStore};
use techconf_worker::{HandleOutcome, NotificationHandler};

fn test_database_config() -> DatabaseConfig {
    let host = env::var("TEST_POSTGRES_HOST")
        .expect("TEST_POSTGRES_HOST must be set to run PostgreSQL tests");
    DatabaseConfig {
        host,
        port: env::var("TEST_POSTGRES_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432),
        user: env::var("TEST_POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string()),
        password: env::var("TEST_POSTGRES_PASSWORD").unwrap_or_else(|_| "postgres".to_string()),
        dbname: env::var("TEST_POSTGRES_DB").unwrap_or_else(|_| "postgres".to_string()),
        ssl_mode: "prefer".to_string(),
        connect_timeout_secs: 10,
    }
}

async fn setup(config: &DatabaseConfig, attendee_count: usize) -> PgConnection {
    let mut conn = PgConnection::connect_with(&connect_options(config).unwrap())
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&mut conn)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE notification, attendee RESTART IDENTITY CASCADE")
        .execute(&mut conn)
        .await
        .unwrap();

    sqlx::query(
        "INSERT INTO notification (id, message, subject, submitted_date) VALUES ($1, $2, $3, $4)",
    )
    .bind(42_i32)
    .bind("The keynote starts at 9am")
    .bind("Reminder")
    .bind(Utc::now().naive_utc())
    .execute(&mut conn)
    .await
    .unwrap();

    for i in 0..attendee_count {
        sqlx::query("INSERT INTO attendee (first_name, last_name, email) VALUES ($1, $2, $3)")
            .bind("Grace")
            .bind("Hopper")
            .bind(format!("attendee{i}@example.com"))
            .execute(&mut conn)
            .await
            .unwrap();
    }

    conn
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_POSTGRES_HOST)"]
async fn records_completion_for_existing_notification() {
    let config = test_database_config();
    let mut conn = setup(&config, 5).await;
    let handler = NotificationHandler::new(Arc::new(PgNotificationStore::new(config)));

    let before = Utc::now().naive_utc();
    let outcome = handler.handle(b"42").await.unwrap();
    let after = Utc::now().naive_utc();

    assert_eq!(
        outcome,
        HandleOutcome::Notified {
            notification_id: 42,
            attendee_count: 5,
            status: "Notified 5 attendees".to_string(),
        }
    );

    let row = NotificationRepository::new()
        .get_by_id(&mut conn, 42)
        .await
        .unwrap()
        .expect("notification 42");
    assert_eq!(row.status.as_deref(), Some("Notified 5 attendees"));
    let completed = row.completed_date.expect("completed_date");
    // Postgres keeps microseconds; chrono may carry nanoseconds
    assert!(completed >= before - chrono::Duration::milliseconds(1));
    assert!(completed <= after);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (TEST_POSTGRES_HOST)"]
async fn missing_and_malformed_messages_write_nothing() {
    let config = test_database_config();
    let mut conn = setup(&config, 2).await;
    let handler = NotificationHandler::new(Arc::new(PgNotificationStore::new(config)));

    let outcome = handler.handle(b"7").await.unwrap();
    assert_eq!(
        outcome,
        HandleOutcome::NotificationMissing { notification_id: 7 }
    );

    let err = handler.handle(b"abc").await.unwrap_err();
    assert!(!err.is_retryable());

    let row = NotificationRepository::new()
        .get_by_id(&mut conn, 42)
        .await
        .unwrap()
        .expect("notification 42");
    assert_eq!(row.status, None);
    assert_eq!(row.completed_date, None);
}

#[tokio::test]
async fn unreachable_database_is_retryable() {
    let config = DatabaseConfig {
        host: "127.0.0.1".to_string(),
        // Nothing listens on port 1
        port: 1,
        user: "postgres".to_string(),
        password: "postgres".to_string(),
        dbname: "techconfdb".to_string(),
        ssl_mode: "disable".to_string(),
        connect_timeout_secs: 2,
    };
    let handler = NotificationHandler::new(Arc::new(PgNotificationStore::new(config)));

    let err = handler.handle(b"42").await.unwrap_err();

    assert!(err.is_retryable());
}
