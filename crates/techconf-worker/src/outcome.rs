/// Result of a handled message. Every variant means the message needs no
/// redelivery; failures that should be retried are returned as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Status and completion date were written and committed.
    Notified {
        notification_id: i32,
        attendee_count: i64,
        status: String,
    },
    /// No notification row has this id; nothing was written.
    NotificationMissing { notification_id: i32 },
    /// A database error occurred while recording completion. The transaction
    /// was rolled back and the failure logged.
    FailureRecorded { notification_id: i32, error: String },
}

impl HandleOutcome {
    pub fn notification_id(&self) -> i32 {
        match self {
            HandleOutcome::Notified {
                notification_id, ..
            }
            | HandleOutcome::NotificationMissing { notification_id }
            | HandleOutcome::FailureRecorded {
                notification_id, ..
            } => *notification_id,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HandleOutcome::Notified { .. } => "notified",
            HandleOutcome::NotificationMissing { .. } => "notification_missing",
            HandleOutcome::FailureRecorded { .. } => "failure_recorded",
        }
    }
}

impl std::fmt::Display for HandleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
