use chrono::NaiveDateTime;
use sqlx::PgConnection;
use techconf_core::models::{Notification, NotificationContent};
use techconf_core::AppError;

/// Queries against the `notification` table.
///
/// Methods take the connection of the caller's transaction rather than a pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotificationRepository;

impl NotificationRepository {
    pub fn new() -> Self {
        Self
    }

    /// Get the message and subject of a notification
    pub async fn get_content(
        &self,
        conn: &mut PgConnection,
        notification_id: i32,
    ) -> Result<Option<NotificationContent>, AppError> {
        let content = sqlx::query_as::<_, NotificationContent>(
            r#"
            SELECT message, subject
            FROM notification
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, notification_id, "Failed to fetch notification");
            AppError::from(e)
        })?;

        Ok(content)
    }

    /// Get a full notification row by ID
    pub async fn get_by_id(
        &self,
        conn: &mut PgConnection,
        notification_id: i32,
    ) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, message, subject, status, submitted_date, completed_date
            FROM notification
            WHERE id = $1
            "#,
        )
        .bind(notification_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, notification_id, "Failed to fetch notification row");
            AppError::from(e)
        })?;

        Ok(notification)
    }

    /// Set status and completion time. Returns the number of rows updated.
    pub async fn mark_completed(
        &self,
        conn: &mut PgConnection,
        notification_id: i32,
        status: &str,
        completed_date: NaiveDateTime,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE notification
            SET completed_date = $1, status = $2
            WHERE id = $3
            "#,
        )
        .bind(completed_date)
        .bind(status)
        .bind(notification_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, notification_id, "Failed to update notification status");
            AppError::from(e)
        })?;

        Ok(result.rows_affected())
    }
}
