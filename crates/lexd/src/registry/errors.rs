//! Error types for handler failures.

use thiserror::Error;

/// Reasons a handler produced no result.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Request parameters did not match the handler's parameter shape.
    #[error("invalid params: {0}")]
    InvalidParams(#[source] serde_json::Error),

    /// The handler output could not be converted to JSON.
    #[error("failed to serialise result: {0}")]
    SerializeResult(#[source] serde_json::Error),

    /// The handler reported a failure of its own.
    #[error("handler failed: {message}")]
    Failed {
        /// Handler-supplied description.
        message: String,
    },

    /// The handler panicked; the panic was contained at the dispatch boundary.
    #[error("handler panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl HandlerError {
    /// Creates a handler-reported failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Creates a contained panic error.
    #[must_use]
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }
}
