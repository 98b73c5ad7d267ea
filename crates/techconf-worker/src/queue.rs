//! Queue consumer: long-poll a message source, hand each message to the
//! handler, then acknowledge or schedule redelivery.
//!
//! Messages are handled one at a time, each to completion. Shutdown is checked
//! between receives; a batch that has been received is always finished.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::Instrument;
use uuid::Uuid;

use techconf_core::QueueConfig;

use crate::context::MessageHandler;
use crate::outcome::HandleOutcome;

/// Delay before polling again after the source itself failed.
const RECEIVE_ERROR_BACKOFF_SECS: u64 = 5;

/// A message received from the queue, not yet acknowledged.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: Bytes,
}

/// Transport seam between the consumer loop and a concrete queue.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Wait for the next batch. May return an empty batch.
    async fn receive(&self) -> Result<Vec<ReceivedMessage>>;

    /// Remove the message from the queue.
    async fn ack(&self, message: &ReceivedMessage) -> Result<()>;

    /// Make the message visible again after `delay_secs`.
    async fn retry_later(&self, message: &ReceivedMessage, delay_secs: i32) -> Result<()>;
}

/// What the consumer did with a message after handling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Handled; deleted from the queue.
    Acked,
    /// Retryable failure; visibility reset so it is redelivered.
    RetryScheduled,
    /// Unrecoverable failure; left to the queue's redrive policy.
    Abandoned,
}

#[derive(Clone, Debug)]
pub struct QueueConsumerConfig {
    pub retry_delay_secs: i32,
    pub receive_error_backoff: Duration,
}

impl Default for QueueConsumerConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: 0,
            receive_error_backoff: Duration::from_secs(RECEIVE_ERROR_BACKOFF_SECS),
        }
    }
}

impl From<&QueueConfig> for QueueConsumerConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            retry_delay_secs: config.retry_delay_secs,
            ..Default::default()
        }
    }
}

pub struct QueueConsumer {
    source: Arc<dyn MessageSource>,
    handler: Arc<dyn MessageHandler>,
    config: QueueConsumerConfig,
}

impl QueueConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        handler: Arc<dyn MessageHandler>,
        config: QueueConsumerConfig,
    ) -> Self {
        Self {
            source,
            handler,
            config,
        }
    }

    /// Run until a shutdown signal arrives (or the sender is dropped).
    pub async fn run(&self, mut shutdown_rx: mpsc::Receiver<()>) {
        tracing::info!(
            retry_delay_secs = self.config.retry_delay_secs,
            "Queue consumer started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Queue consumer shutting down");
                    break;
                }
                received = self.source.receive() => {
                    match received {
                        Ok(messages) => self.process_batch(&messages).await,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to receive messages, backing off");
                            tokio::select! {
                                _ = shutdown_rx.recv() => break,
                                _ = sleep(self.config.receive_error_backoff) => {}
                            }
                        }
                    }
                }
            }
        }

        tracing::info!("Queue consumer stopped");
    }

    async fn process_batch(&self, messages: &[ReceivedMessage]) {
        for message in messages {
            self.process_message(message).await;
        }
    }

    /// Handle a single message and apply the redelivery decision.
    pub async fn process_message(&self, message: &ReceivedMessage) -> Disposition {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "handle_message",
            %invocation_id,
            message_id = %message.message_id
        );

        async {
            match self.handler.handle_message(&message.body).await {
                Ok(outcome) => {
                    log_outcome(&outcome);
                    if let Err(e) = self.source.ack(message).await {
                        // Redelivered after the visibility timeout; the handler tolerates repeats
                        tracing::error!(error = %e, "Failed to acknowledge message");
                    }
                    Disposition::Acked
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(error = %e, "Invocation failed, scheduling redelivery");
                    if let Err(e) = self
                        .source
                        .retry_later(message, self.config.retry_delay_secs)
                        .await
                    {
                        tracing::error!(error = %e, "Failed to reset message visibility");
                    }
                    Disposition::RetryScheduled
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Invocation failed permanently, leaving message to the queue redrive policy"
                    );
                    Disposition::Abandoned
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn log_outcome(outcome: &HandleOutcome) {
    let notification_id = outcome.notification_id();
    match outcome {
        HandleOutcome::Notified { .. } => {
            tracing::debug!(outcome = %outcome, notification_id, "Message handled");
        }
        HandleOutcome::NotificationMissing { .. } => {
            tracing::info!(outcome = %outcome, notification_id, "Message acknowledged without update");
        }
        HandleOutcome::FailureRecorded { error, .. } => {
            tracing::warn!(
                outcome = %outcome,
                notification_id,
                error = %error,
                "Message acknowledged after recorded failure"
            );
        }
    }
}
