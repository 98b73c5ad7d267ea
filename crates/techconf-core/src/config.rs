//! Configuration module
//!
//! Configuration for the notification function: database connection options,
//! queue polling, and outbound email. Everything is read once at process start
//! and passed explicitly to the store, handler, sender and consumer.

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context};

// Common constants
const POSTGRES_PORT: u16 = 5432;
const POSTGRES_DB: &str = "techconfdb";
const POSTGRES_SSLMODE: &str = "prefer";
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const QUEUE_MAX_MESSAGES: i32 = 10;
const QUEUE_WAIT_TIME_SECS: i32 = 20;
const QUEUE_VISIBILITY_TIMEOUT_SECS: i32 = 60;
const QUEUE_RETRY_DELAY_SECS: i32 = 0;
const ADMIN_EMAIL_ADDRESS: &str = "info@techconf.com";
const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";
const SENDGRID_TIMEOUT_SECS: u64 = 30;

const SSL_MODES: &[&str] = &[
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("Unknown LOG_FORMAT '{}', expected text or json", other)),
        }
    }
}

/// Connection parameters for the relational store.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub ssl_mode: String,
    pub connect_timeout_secs: u64,
}

// Password stays out of logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("ssl_mode", &self.ssl_mode)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Queue polling configuration
#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub queue_url: String,
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub visibility_timeout_secs: i32,
    /// Visibility applied to a message whose handling failed with a retryable error.
    pub retry_delay_secs: i32,
}

/// Outbound email configuration (SendGrid)
#[derive(Clone)]
pub struct EmailConfig {
    pub from_address: String,
    pub api_key: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from_address", &self.from_address)
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_format: LogFormat,
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    /// `None` when no SendGrid API key is configured.
    pub email: Option<EmailConfig>,
}

impl Config {
    /// Load configuration from the process environment (and a `.env` file if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow!("{} must be set", key))
        };

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let log_format = match var("LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::Text,
        };

        let database = DatabaseConfig {
            host: required("POSTGRES_HOST")?,
            port: parse_or(var("POSTGRES_PORT"), "POSTGRES_PORT", POSTGRES_PORT)?,
            user: required("POSTGRES_USER")?,
            password: var("POSTGRES_PW")
                .or_else(|| var("POSTGRES_PASSWORD"))
                .ok_or_else(|| anyhow!("POSTGRES_PW or POSTGRES_PASSWORD must be set"))?,
            dbname: var("POSTGRES_DB").unwrap_or_else(|| POSTGRES_DB.to_string()),
            ssl_mode: var("POSTGRES_SSLMODE")
                .map(|s| s.to_lowercase())
                .unwrap_or_else(|| POSTGRES_SSLMODE.to_string()),
            connect_timeout_secs: parse_or(
                var("DB_TIMEOUT_SECONDS"),
                "DB_TIMEOUT_SECONDS",
                CONNECTION_TIMEOUT_SECS,
            )?,
        };

        let queue = QueueConfig {
            queue_url: required("NOTIFICATION_QUEUE_URL")?,
            max_messages: parse_or(var("QUEUE_MAX_MESSAGES"), "QUEUE_MAX_MESSAGES", QUEUE_MAX_MESSAGES)?,
            wait_time_seconds: parse_or(
                var("QUEUE_WAIT_TIME_SECONDS"),
                "QUEUE_WAIT_TIME_SECONDS",
                QUEUE_WAIT_TIME_SECS,
            )?,
            visibility_timeout_secs: parse_or(
                var("QUEUE_VISIBILITY_TIMEOUT_SECONDS"),
                "QUEUE_VISIBILITY_TIMEOUT_SECONDS",
                QUEUE_VISIBILITY_TIMEOUT_SECS,
            )?,
            retry_delay_secs: parse_or(
                var("QUEUE_RETRY_DELAY_SECONDS"),
                "QUEUE_RETRY_DELAY_SECONDS",
                QUEUE_RETRY_DELAY_SECS,
            )?,
        };

        let email = match var("SENDGRID_API_KEY") {
            Some(api_key) => Some(EmailConfig {
                from_address: var("ADMIN_EMAIL_ADDRESS")
                    .unwrap_or_else(|| ADMIN_EMAIL_ADDRESS.to_string()),
                api_key,
                api_base: var("SENDGRID_API_BASE")
                    .map(|s| s.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| SENDGRID_API_BASE.to_string()),
                timeout_secs: parse_or(
                    var("SENDGRID_TIMEOUT_SECONDS"),
                    "SENDGRID_TIMEOUT_SECONDS",
                    SENDGRID_TIMEOUT_SECS,
                )?,
            }),
            None => None,
        };

        let config = Config {
            environment,
            log_format,
            database,
            queue,
            email,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !SSL_MODES.contains(&self.database.ssl_mode.as_str()) {
            return Err(anyhow!(
                "POSTGRES_SSLMODE must be one of {}",
                SSL_MODES.join(", ")
            ));
        }

        if self.database.connect_timeout_secs == 0 {
            return Err(anyhow!("DB_TIMEOUT_SECONDS must be greater than zero"));
        }

        if !(1..=10).contains(&self.queue.max_messages) {
            return Err(anyhow!("QUEUE_MAX_MESSAGES must be between 1 and 10"));
        }

        if !(0..=20).contains(&self.queue.wait_time_seconds) {
            return Err(anyhow!("QUEUE_WAIT_TIME_SECONDS must be between 0 and 20"));
        }

        if self.queue.visibility_timeout_secs < 0 || self.queue.retry_delay_secs < 0 {
            return Err(anyhow!(
                "QUEUE_VISIBILITY_TIMEOUT_SECONDS and QUEUE_RETRY_DELAY_SECONDS must not be negative"
            ));
        }

        if let Some(email) = &self.email {
            if !email.from_address.contains('@') {
                return Err(anyhow!(
                    "ADMIN_EMAIL_ADDRESS must be a valid email address when SENDGRID_API_KEY is set"
                ));
            }
            if !email.api_base.starts_with("http://") && !email.api_base.starts_with("https://") {
                return Err(anyhow!("SENDGRID_API_BASE must be an http(s) URL"));
            }
        }

        Ok(())
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", key, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("POSTGRES_HOST", "db.example.com"),
            ("POSTGRES_USER", "techconf"),
            ("POSTGRES_PW", "secret"),
            (
                "NOTIFICATION_QUEUE_URL",
                "http://localhost:4566/000000000000/notificationqueue",
            ),
        ]
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::from_lookup(lookup_from(&base_vars())).unwrap();

        assert_eq!(config.environment, "development");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.dbname, "techconfdb");
        assert_eq!(config.database.ssl_mode, "prefer");
        assert_eq!(config.database.connect_timeout_secs, 30);
        assert_eq!(config.queue.max_messages, 10);
        assert_eq!(config.queue.wait_time_seconds, 20);
        assert_eq!(config.queue.retry_delay_secs, 0);
        assert!(config.email.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn missing_host_is_rejected() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "POSTGRES_HOST")
            .collect();
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("POSTGRES_HOST"));
    }

    #[test]
    fn password_falls_back_to_postgres_password() {
        let mut vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "POSTGRES_PW")
            .collect();
        vars.push(("POSTGRES_PASSWORD", "other"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.database.password, "other");
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut vars = base_vars();
        vars.push(("POSTGRES_PORT", "not-a-port"));
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.to_string().contains("POSTGRES_PORT"));
    }

    #[test]
    fn email_config_requires_api_key() {
        let mut vars = base_vars();
        vars.push(("ADMIN_EMAIL_ADDRESS", "admin@techconf.com"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert!(config.email.is_none());

        vars.push(("SENDGRID_API_KEY", "SG.key"));
        vars.push(("SENDGRID_API_BASE", "http://127.0.0.1:9000/"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        let email = config.email.expect("email config");
        assert_eq!(email.from_address, "admin@techconf.com");
        assert_eq!(email.api_key, "SG.key");
        assert_eq!(email.api_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn queue_bounds_are_validated() {
        let mut vars = base_vars();
        vars.push(("QUEUE_MAX_MESSAGES", "11"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());

        let mut vars = base_vars();
        vars.push(("QUEUE_WAIT_TIME_SECONDS", "21"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn unknown_ssl_mode_is_rejected() {
        let mut vars = base_vars();
        vars.push(("POSTGRES_SSLMODE", "sometimes"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut vars = base_vars();
        vars.push(("SENDGRID_API_KEY", "SG.very-secret"));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("SG.very-secret"));
        assert!(!debug.contains("\"secret\""));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
