//! TechConf Database Layer
//!
//! Per-invocation connections, transaction handling, and the notification and
//! attendee repositories. The handler talks to the database only through the
//! [`NotificationStore`] / [`NotificationSession`] traits.

pub mod db;
pub mod store;

// Re-exports: Repositories and connection helpers
pub use db::{
    connect_options, AttendeeRepository, NotificationRepository, ScopedConnection,
    TransactionGuard,
};

// Re-exports: Store traits and the PostgreSQL implementation
pub use store::{
    NotificationSession, NotificationStore, PgNotificationSession, PgNotificationStore,
};
