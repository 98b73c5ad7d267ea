use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Notification record as stored in the `notification` table.
///
/// `completed_date` is a naive UTC timestamp (`timestamp without time zone`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i32,
    pub message: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub submitted_date: Option<NaiveDateTime>,
    pub completed_date: Option<NaiveDateTime>,
}

/// The part of a notification the handler reads before recording completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct NotificationContent {
    pub message: Option<String>,
    pub subject: Option<String>,
}

/// Status written back once attendees have been counted.
pub fn completion_status(attendee_count: i64) -> String {
    format!("Notified {} attendees", attendee_count)
}
