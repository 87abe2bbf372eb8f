//! Errors raised while reading frame headers.

use thiserror::Error;

/// Reasons leading bytes could not start a frame.
///
/// None of these are fatal: the offending bytes are dropped and extraction
/// resumes at the next `Content-Length` line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The header block carried no `Content-Length` line.
    #[error("header block has no Content-Length line")]
    MissingContentLength,
    /// The `Content-Length` value was not a decimal byte count.
    #[error("invalid Content-Length value: {value:?}")]
    InvalidContentLength {
        /// Raw header value.
        value: String,
    },
    /// Bytes that are not header lines sat in front of a `Content-Length`
    /// line.
    #[error("{len} stray bytes before the next header")]
    UnexpectedBytes {
        /// Number of bytes dropped.
        len: usize,
    },
    /// No complete header arrived within `limit` bytes.
    #[error("no complete header within {limit} bytes")]
    HeaderTooLarge {
        /// Header size ceiling.
        limit: usize,
    },
}

impl FrameError {
    /// Creates an invalid length error.
    #[must_use]
    pub fn invalid_content_length(value: impl Into<String>) -> Self {
        Self::InvalidContentLength {
            value: value.into(),
        }
    }
}
