//! TechConf Core Library
//!
//! Configuration, error types and data models shared by the notification
//! function crates.

pub mod config;
pub mod error;
pub mod invocation_error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, DatabaseConfig, EmailConfig, LogFormat, QueueConfig};
pub use error::AppError;
pub use invocation_error::{InvocationError, InvocationResultExt};
