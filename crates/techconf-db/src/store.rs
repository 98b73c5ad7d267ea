//! Store abstractions used by the notification handler
//!
//! These traits define the minimal interface the handler needs from the
//! database, allowing it to be tested without a running PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use techconf_core::models::NotificationContent;
use techconf_core::{AppError, DatabaseConfig};

use crate::db::{AttendeeRepository, NotificationRepository, ScopedConnection, TransactionGuard};

/// Opens one session per invocation.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Open a fresh connection and begin a transaction.
    async fn open(&self) -> Result<Box<dyn NotificationSession>, AppError>;
}

/// A connection with an open transaction, owned by a single invocation.
#[async_trait]
pub trait NotificationSession: Send {
    async fn find_notification(
        &mut self,
        notification_id: i32,
    ) -> Result<Option<NotificationContent>, AppError>;

    async fn count_attendees(&mut self) -> Result<i64, AppError>;

    /// Returns the number of rows updated.
    async fn mark_completed(
        &mut self,
        notification_id: i32,
        status: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    async fn commit(&mut self) -> Result<(), AppError>;

    /// No-op once the transaction has been committed or rolled back.
    async fn rollback(&mut self) -> Result<(), AppError>;

    /// Roll back anything still open and release the connection.
    async fn close(self: Box<Self>);
}

/// PostgreSQL-backed store. Holds configuration only; no pool survives an invocation.
#[derive(Clone, Debug)]
pub struct PgNotificationStore {
    config: DatabaseConfig,
}

impl PgNotificationStore {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn open(&self) -> Result<Box<dyn NotificationSession>, AppError> {
        let connection = ScopedConnection::open(&self.config).await?;
        let tx = match connection.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                connection.close().await;
                return Err(e);
            }
        };

        Ok(Box::new(PgNotificationSession {
            tx: Some(tx),
            connection,
            notifications: NotificationRepository::new(),
            attendees: AttendeeRepository::new(),
        }))
    }
}

pub struct PgNotificationSession {
    tx: Option<TransactionGuard>,
    connection: ScopedConnection,
    notifications: NotificationRepository,
    attendees: AttendeeRepository,
}

impl PgNotificationSession {
    fn tx(&mut self) -> Result<&mut TransactionGuard, AppError> {
        self.tx
            .as_mut()
            .ok_or_else(|| AppError::Internal("Session transaction already finished".to_string()))
    }
}

#[async_trait]
impl NotificationSession for PgNotificationSession {
    async fn find_notification(
        &mut self,
        notification_id: i32,
    ) -> Result<Option<NotificationContent>, AppError> {
        let notifications = self.notifications;
        let conn = self.tx()?.connection()?;
        notifications.get_content(conn, notification_id).await
    }

    async fn count_attendees(&mut self) -> Result<i64, AppError> {
        let attendees = self.attendees;
        let conn = self.tx()?.connection()?;
        attendees.count_all(conn).await
    }

    async fn mark_completed(
        &mut self,
        notification_id: i32,
        status: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let notifications = self.notifications;
        let conn = self.tx()?.connection()?;
        notifications
            .mark_completed(conn, notification_id, status, completed_at.naive_utc())
            .await
    }

    async fn commit(&mut self) -> Result<(), AppError> {
        match self.tx.take() {
            Some(tx) => tx.commit().await,
            None => Err(AppError::Internal(
                "Session transaction already finished".to_string(),
            )),
        }
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }

    async fn close(self: Box<Self>) {
        let mut session = *self;
        if let Err(e) = session.rollback().await {
            tracing::warn!(error = %e, "Rollback on close failed");
        }
        session.connection.close().await;
    }
}
