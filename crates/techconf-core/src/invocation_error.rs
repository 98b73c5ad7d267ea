//! Invocation error types
//!
//! An invocation error tells the queue adapter whether a failed message should
//! be redelivered soon (retryable) or left to the queue's own redrive policy
//! (unrecoverable, e.g. a payload that will never parse).

use std::fmt;

use crate::error::AppError;

/// Failure of a single message invocation.
#[derive(Debug)]
pub struct InvocationError {
    inner: anyhow::Error,
    retryable: bool,
}

impl InvocationError {
    /// Redelivering the same message cannot succeed: malformed payloads,
    /// invalid connection settings.
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            retryable: false,
        }
    }

    /// The message may succeed later: database unreachable, connection refused.
    pub fn retryable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            retryable: true,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<AppError> for InvocationError {
    /// Only driver and server failures are worth another delivery; bad
    /// settings and internal faults repeat on every attempt.
    fn from(err: AppError) -> Self {
        if err.is_database() {
            Self::retryable(err)
        } else {
            Self::unrecoverable(err)
        }
    }
}

/// Extension trait for Result to mark failures as unrecoverable
pub trait InvocationResultExt<T> {
    fn unrecoverable(self) -> Result<T, InvocationError>;
}

impl<T, E: Into<anyhow::Error>> InvocationResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, InvocationError> {
        self.map_err(|e| InvocationError::unrecoverable(e.into()))
    }
}
