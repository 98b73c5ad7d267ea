//! TechConf Services
//!
//! Clients for external services used by the notification function.

pub mod services;

pub use services::email::{EmailError, EmailSender, SendGridEmailSender};
