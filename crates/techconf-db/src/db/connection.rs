//! Per-invocation database connection
//!
//! Each invocation opens its own connection and releases it before returning.
//! The connection is held by a single-connection pool so that a transaction can
//! own it (`Transaction<'static, Postgres>`) and so the connect timeout applies.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use techconf_core::{AppError, DatabaseConfig};

use super::transaction::TransactionGuard;

const APPLICATION_NAME: &str = "techconf-notification-function";

/// Build connection options from the recognized `{host, port, user, password, dbname}` set.
pub fn connect_options(config: &DatabaseConfig) -> Result<PgConnectOptions, AppError> {
    let ssl_mode = PgSslMode::from_str(&config.ssl_mode).map_err(|e| {
        AppError::Config(format!("Invalid ssl mode '{}': {}", config.ssl_mode, e))
    })?;

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.dbname)
        .ssl_mode(ssl_mode)
        .application_name(APPLICATION_NAME))
}

/// A connection opened for exactly one invocation.
///
/// Call [`ScopedConnection::close`] once the invocation is done; the handler
/// does so on every exit path.
pub struct ScopedConnection {
    pool: PgPool,
}

impl ScopedConnection {
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options = connect_options(config)?;

        tracing::debug!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "Opening database connection"
        );

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, host = %config.host, "Failed to connect to database");
                AppError::from(e)
            })?;

        Ok(Self { pool })
    }

    /// Begin a transaction on this connection.
    pub async fn begin(&self) -> Result<TransactionGuard, AppError> {
        TransactionGuard::begin(&self.pool).await
    }

    /// Release the connection.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::debug!("Database connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(ssl_mode: &str) -> DatabaseConfig {
        DatabaseConfig {
            host: "db.example.com".to_string(),
            port: 6543,
            user: "techconf".to_string(),
            password: "secret".to_string(),
            dbname: "techconfdb".to_string(),
            ssl_mode: ssl_mode.to_string(),
            connect_timeout_secs: 5,
        }
    }

    #[test]
    fn options_carry_connection_parameters() {
        let options = connect_options(&config("require")).unwrap();
        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "techconf");
        assert_eq!(options.get_database(), Some("techconfdb"));
    }

    #[test]
    fn invalid_ssl_mode_is_a_config_error() {
        let err = connect_options(&config("sometimes")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
