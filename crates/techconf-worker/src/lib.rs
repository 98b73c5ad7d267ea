//! TechConf Worker – queue-triggered notification handling.
//!
//! The [`NotificationHandler`] processes one message payload per invocation.
//! The [`QueueConsumer`] polls a [`MessageSource`] (SQS in production), calls
//! the handler through the [`MessageHandler`] trait, and acknowledges or
//! reschedules each message according to the result.

mod context;
mod handler;
mod outcome;
mod payload;
mod queue;
mod sqs;

pub use context::MessageHandler;
pub use handler::NotificationHandler;
pub use outcome::HandleOutcome;
pub use payload::{parse_notification_id, PayloadError};
pub use queue::{
    Disposition, MessageSource, QueueConsumer, QueueConsumerConfig, ReceivedMessage,
};
pub use sqs::SqsMessageSource;
