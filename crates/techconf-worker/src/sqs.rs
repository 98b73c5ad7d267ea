//! SQS-backed message source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use bytes::Bytes;

use techconf_core::QueueConfig;

use crate::queue::{MessageSource, ReceivedMessage};

pub struct SqsMessageSource {
    client: SqsClient,
    config: QueueConfig,
}

impl SqsMessageSource {
    pub fn new(client: SqsClient, config: QueueConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl MessageSource for SqsMessageSource {
    async fn receive(&self) -> Result<Vec<ReceivedMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(self.config.max_messages)
            .wait_time_seconds(self.config.wait_time_seconds)
            .visibility_timeout(self.config.visibility_timeout_secs)
            .send()
            .await
            .context("Failed to receive messages from queue")?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|msg| {
                let Some(receipt_handle) = msg.receipt_handle() else {
                    tracing::warn!(
                        message_id = msg.message_id().unwrap_or_default(),
                        "Received message without receipt handle, skipping"
                    );
                    return None;
                };
                Some(ReceivedMessage {
                    message_id: msg.message_id().unwrap_or_default().to_string(),
                    receipt_handle: receipt_handle.to_string(),
                    // A missing body is handled as an empty payload
                    body: Bytes::copy_from_slice(msg.body().unwrap_or_default().as_bytes()),
                })
            })
            .collect::<Vec<_>>();

        if !messages.is_empty() {
            tracing::debug!(count = messages.len(), "Received messages");
        }

        Ok(messages)
    }

    async fn ack(&self, message: &ReceivedMessage) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(&message.receipt_handle)
            .send()
            .await
            .with_context(|| format!("Failed to delete message {}", message.message_id))?;

        Ok(())
    }

    async fn retry_later(&self, message: &ReceivedMessage, delay_secs: i32) -> Result<()> {
        self.client
            .change_message_visibility()
            .queue_url(&self.config.queue_url)
            .receipt_handle(&message.receipt_handle)
            .visibility_timeout(delay_secs)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to change visibility of message {}",
                    message.message_id
                )
            })?;

        Ok(())
    }
}
