//! Message handler trait
//!
//! The queue consumer calls `handle_message` once per received message and
//! decides acknowledgement and redelivery from the returned result.

use async_trait::async_trait;

use techconf_core::InvocationError;

use crate::outcome::HandleOutcome;

/// Handles one inbound message payload to completion.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, payload: &[u8]) -> Result<HandleOutcome, InvocationError>;
}
