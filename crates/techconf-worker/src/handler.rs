//! Notification handler
//!
//! One invocation per queue message: parse the notification id, open a fresh
//! database session, read the notification, count attendees, write the
//! completion status, commit, and release the connection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use techconf_core::models::completion_status;
use techconf_core::{AppError, InvocationError, InvocationResultExt};
use techconf_db::{NotificationSession, NotificationStore};

use crate::context::MessageHandler;
use crate::outcome::HandleOutcome;
use crate::payload::parse_notification_id;

#[derive(Clone)]
pub struct NotificationHandler {
    store: Arc<dyn NotificationStore>,
}

impl NotificationHandler {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Handle one message payload.
    ///
    /// Malformed payloads fail before any database work and are unrecoverable.
    /// Failure to reach the database is retryable. Database errors after the
    /// connection is open are rolled back, logged, and reported as
    /// [`HandleOutcome::FailureRecorded`].
    pub async fn handle(&self, payload: &[u8]) -> Result<HandleOutcome, InvocationError> {
        let notification_id = parse_notification_id(payload).unrecoverable()?;
        info!(notification_id, "Queue trigger processed message");

        let mut session = self.store.open().await.map_err(|e| {
            error!(error = %e, notification_id, "Failed to open database connection");
            InvocationError::from(e)
        })?;

        let outcome = match record_completion(session.as_mut(), notification_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    error = %e,
                    notification_id,
                    "Failed to record notification completion"
                );
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, notification_id, "Rollback failed");
                }
                HandleOutcome::FailureRecorded {
                    notification_id,
                    error: e.to_string(),
                }
            }
        };

        session.close().await;
        Ok(outcome)
    }
}

async fn record_completion(
    session: &mut dyn NotificationSession,
    notification_id: i32,
) -> Result<HandleOutcome, AppError> {
    let Some(content) = session.find_notification(notification_id).await? else {
        warn!(notification_id, "Notification not found, nothing recorded");
        session.rollback().await?;
        return Ok(HandleOutcome::NotificationMissing { notification_id });
    };

    let attendee_count = session.count_attendees().await?;
    let status = completion_status(attendee_count);

    let updated = session
        .mark_completed(notification_id, &status, Utc::now())
        .await?;
    if updated == 0 {
        // Row deleted between the read and the update
        warn!(notification_id, "Notification vanished before update, nothing recorded");
        session.rollback().await?;
        return Ok(HandleOutcome::NotificationMissing { notification_id });
    }

    session.commit().await?;

    info!(
        notification_id,
        attendee_count,
        status = %status,
        subject = content.subject.as_deref().unwrap_or_default(),
        "Notification marked completed"
    );

    Ok(HandleOutcome::Notified {
        notification_id,
        attendee_count,
        status,
    })
}

#[async_trait]
impl MessageHandler for NotificationHandler {
    async fn handle_message(&self, payload: &[u8]) -> Result<HandleOutcome, InvocationError> {
        self.handle(payload).await
    }
}
