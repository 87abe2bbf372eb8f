//! Error types for the dispatch loop.
//!
//! Only stream failures surface as [`DispatchError`]. Everything that goes
//! wrong with a single message is reported as a [`DropReason`] instead and the
//! loop carries on with the next frame.

use std::io;

use thiserror::Error;

use crate::codec::FrameError;
use crate::protocol::{MessageError, RequestId};
use crate::registry::{HandlerError, Method};

/// Failures that end the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Reading the input stream or writing the output stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A response could not be serialised.
    #[error("failed to serialise response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

/// Why a frame produced no response.
#[derive(Debug, Error)]
pub enum DropReason {
    /// Bytes that could not start a frame were discarded.
    #[error("malformed frame: {0}")]
    MalformedFrame(#[source] FrameError),

    /// The declared payload exceeds the configured limit and is skipped.
    #[error("frame of {declared} bytes exceeds the {limit} byte limit")]
    OversizedFrame {
        /// Length announced by the header.
        declared: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// The payload is not a request object.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[source] MessageError),

    /// No handler is registered for the method.
    #[error("unknown method '{method}' for request {id}")]
    UnknownMethod {
        /// Identifier of the dropped request.
        id: RequestId,
        /// Method name as received.
        method: String,
    },

    /// The handler returned an error or panicked.
    #[error("{method} handler failed for request {id}: {error}")]
    HandlerFailed {
        /// Identifier of the dropped request.
        id: RequestId,
        /// Method whose handler failed.
        method: Method,
        /// Failure reported by the handler.
        #[source]
        error: HandlerError,
    },
}
