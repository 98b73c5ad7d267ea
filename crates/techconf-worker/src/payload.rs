//! Inbound message payload parsing.
//!
//! The payload is the UTF-8 decimal form of a notification identifier.

use std::num::ParseIntError;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Message payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("Message payload '{payload}' is not a notification id: {source}")]
    NotAnInteger {
        payload: String,
        #[source]
        source: ParseIntError,
    },
}

/// Decode a payload into a notification id.
///
/// Surrounding Unicode whitespace is ignored. Signs are accepted, digit
/// separators (`1_0`) are not.
pub fn parse_notification_id(payload: &[u8]) -> Result<i32, PayloadError> {
    let text = std::str::from_utf8(payload)?;
    let trimmed = text.trim();
    trimmed
        .parse::<i32>()
        .map_err(|source| PayloadError::NotAnInteger {
            payload: trimmed.to_string(),
            source,
        })
}
