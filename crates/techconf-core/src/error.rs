//! Error types module
//!
//! `AppError` is the error type returned by the store and repositories.
//!
//! The `Database` variant carries the driver error when the `sqlx` feature is on.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the failure came from the database driver or server.
    pub fn is_database(&self) -> bool {
        matches!(self, AppError::Database(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlx")]
    #[test]
    fn driver_errors_map_to_database() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(err.is_database());
        assert!(err.to_string().starts_with("Database error"));
    }

    #[test]
    fn display_includes_message() {
        let err = AppError::Config("Invalid ssl mode 'sometimes'".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid ssl mode 'sometimes'"
        );
    }
}
