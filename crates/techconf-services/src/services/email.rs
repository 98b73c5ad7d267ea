//! Email sender backed by the SendGrid v3 mail API.
//!
//! Sends one plain-text message to one recipient per call. Failures are
//! returned to the caller unchanged; there is no retry.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use techconf_core::EmailConfig;

const MAIL_SEND_PATH: &str = "/v3/mail/send";

#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email delivery API rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid email configuration: {0}")]
    InvalidConfig(String),
}

/// Sends a single plain-text email.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(&self, recipient: &str, subject: &str, body: &str)
        -> Result<(), EmailError>;
}

// SendGrid mail/send request
#[derive(Debug, Serialize, PartialEq)]
struct MailSendRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize, PartialEq)]
struct EmailAddress {
    email: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Clone)]
pub struct SendGridEmailSender {
    client: reqwest::Client,
    api_key: String,
    from: String,
    api_base: String,
}

impl SendGridEmailSender {
    /// Create a sender from configuration. The sender address and API key are
    /// fixed for the lifetime of the sender.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        if config.api_key.is_empty() {
            return Err(EmailError::InvalidConfig(
                "SENDGRID_API_KEY must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            from: config.from_address.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn mail_send_url(&self) -> String {
        format!("{}{}", self.api_base, MAIL_SEND_PATH)
    }

    fn build_request(&self, recipient: &str, subject: &str, body: &str) -> MailSendRequest {
        MailSendRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: recipient.to_string(),
                }],
            }],
            from: EmailAddress {
                email: self.from.clone(),
            },
            subject: subject.to_string(),
            content: vec![Content {
                content_type: "text/plain".to_string(),
                value: body.to_string(),
            }],
        }
    }
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let request = self.build_request(recipient, subject, body);

        let response = self
            .client
            .post(self.mail_send_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), "Email accepted for delivery");
        Ok(())
    }
}
