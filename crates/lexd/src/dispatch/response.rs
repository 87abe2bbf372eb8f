//! Framed response output.

use std::io::Write;

use tracing::trace;

use crate::codec;
use crate::protocol::ResponseMessage;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;

/// Writes framed responses to the output stream.
///
/// Every response is flushed as soon as it is written so the client sees it
/// before the next frame is dispatched.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialises, frames and flushes `response`, returning the number of
    /// bytes written.
    ///
    /// Nothing is written when serialisation fails.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SerializeResponse`] if the response cannot be
    /// serialised and [`DispatchError::Io`] if writing or flushing fails.
    pub fn write_response(&mut self, response: &ResponseMessage) -> Result<usize, DispatchError> {
        let payload = response.to_payload()?;
        let frame = codec::encode(&payload);
        self.writer.write_all(&frame)?;
        self.writer.flush()?;
        trace!(
            target: DISPATCH_TARGET,
            id = %response.id,
            bytes = frame.len(),
            "response written"
        );
        Ok(frame.len())
    }

    /// Borrows the wrapped stream.
    #[must_use]
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns the wrapped stream.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}
