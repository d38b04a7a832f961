//! Dispatch error types.

use std::any::Any;

/// A fault raised by a handler. Always answered with a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("response serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{0}")]
    Fault(String),
}

impl HandlerError {
    /// Shorthand for `HandlerError::Fault`.
    pub fn fault(message: impl Into<String>) -> Self {
        HandlerError::Fault(message.into())
    }
}

/// Why a queued task produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// The task panicked. The worker kept running.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The worker is gone and will never run the task.
    #[error("affinity queue '{0}' is closed")]
    Closed(String),
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
