use sqlx::PgConnection;
use techconf_core::AppError;

/// Read-only queries against the `attendee` table.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttendeeRepository;

impl AttendeeRepository {
    pub fn new() -> Self {
        Self
    }

    /// Count every attendee row. Not scoped to a conference.
    pub async fn count_all(&self, conn: &mut PgConnection) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendee")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to count attendees");
                AppError::from(e)
            })?;

        Ok(count)
    }
}
