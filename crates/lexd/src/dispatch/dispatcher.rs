//! Frame draining and per-request dispatch.

use std::any::Any;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec::{Frame, FrameDecode, ReceiveBuffer};
use crate::protocol::{RequestId, RequestMessage, ResponseMessage};
use crate::registry::{Handler, HandlerError, Method, MethodRegistry};

use super::DISPATCH_TARGET;
use super::errors::{DispatchError, DropReason};
use super::response::ResponseWriter;

/// Outcome of one extracted frame.
#[derive(Debug)]
pub enum DispatchResult {
    /// A handler answered and its response was written.
    Dispatched {
        /// Identifier echoed in the response.
        id: RequestId,
        /// Method that handled the request.
        method: Method,
        /// Size of the framed response.
        bytes: usize,
    },
    /// The frame produced no output.
    Dropped(DropReason),
}

impl DispatchResult {
    /// Returns true when a response was written.
    #[must_use]
    pub const fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Counters describing a finished session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Frames answered with a response.
    pub dispatched: usize,
    /// Frames dropped without a response.
    pub dropped: usize,
    /// Bytes of an unfinished frame left when the input closed.
    pub unconsumed_bytes: usize,
}

impl SessionSummary {
    fn record(&mut self, result: &DispatchResult) {
        if result.is_dispatched() {
            self.dispatched += 1;
        } else {
            self.dropped += 1;
        }
    }
}

/// Drives the receive buffer and the method registry for one stream.
///
/// The dispatcher owns the only receive buffer of the session. Frames are
/// handled strictly in arrival order and each response is written before the
/// next frame is looked at.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    buffer: ReceiveBuffer,
}

impl Dispatcher {
    /// Creates a dispatcher accepting payloads of at most `max_frame_bytes`.
    #[must_use]
    pub fn new(registry: Arc<MethodRegistry>, max_frame_bytes: usize) -> Self {
        Self {
            registry,
            buffer: ReceiveBuffer::new(max_frame_bytes),
        }
    }

    /// Buffered bytes not yet consumed as frames.
    #[must_use]
    pub const fn buffer(&self) -> &ReceiveBuffer {
        &self.buffer
    }

    /// Appends `chunk` and dispatches every frame it completes.
    ///
    /// Returns one result per extracted frame, in arrival order. An empty
    /// vector means the chunk completed no frame.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when a response cannot be written.
    pub fn feed<W: Write>(
        &mut self,
        chunk: &[u8],
        writer: &mut ResponseWriter<W>,
    ) -> Result<Vec<DispatchResult>, DispatchError> {
        self.buffer.extend(chunk);
        let mut results = Vec::new();
        loop {
            let result = match self.buffer.next_frame() {
                FrameDecode::Incomplete => break,
                FrameDecode::Frame(frame) => self.dispatch_frame(&frame, writer)?,
                FrameDecode::Malformed(error) => {
                    warn!(target: DISPATCH_TARGET, %error, "discarding bytes up to the next frame header");
                    DispatchResult::Dropped(DropReason::MalformedFrame(error))
                }
                FrameDecode::Oversized { declared, limit } => {
                    warn!(
                        target: DISPATCH_TARGET,
                        declared,
                        limit,
                        "skipping oversized frame"
                    );
                    DispatchResult::Dropped(DropReason::OversizedFrame { declared, limit })
                }
            };
            results.push(result);
        }
        Ok(results)
    }

    /// Reads `reader` to end of stream, dispatching frames as they complete.
    ///
    /// Reads are `chunk_size` bytes at most and interrupted reads are retried.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when reading or writing fails.
    pub fn serve<R: Read, W: Write>(
        &mut self,
        reader: &mut R,
        writer: &mut ResponseWriter<W>,
        chunk_size: usize,
    ) -> Result<SessionSummary, DispatchError> {
        let mut chunk = vec![0_u8; chunk_size.max(1)];
        let mut summary = SessionSummary::default();

        loop {
            let bytes_read = read_with_retry(reader, &mut chunk)?;
            if bytes_read == 0 {
                break;
            }
            let received = chunk.get(..bytes_read).unwrap_or_default();
            for result in self.feed(received, writer)? {
                summary.record(&result);
            }
        }

        summary.unconsumed_bytes = self.buffer.len();
        if summary.unconsumed_bytes > 0 {
            warn!(
                target: DISPATCH_TARGET,
                bytes = summary.unconsumed_bytes,
                "input closed inside a frame"
            );
        }
        info!(
            target: DISPATCH_TARGET,
            dispatched = summary.dispatched,
            dropped = summary.dropped,
            "input closed"
        );
        Ok(summary)
    }

    fn dispatch_frame<W: Write>(
        &self,
        frame: &Frame,
        writer: &mut ResponseWriter<W>,
    ) -> Result<DispatchResult, DispatchError> {
        let request = match RequestMessage::parse(frame.payload()) {
            Ok(request) => request,
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %error,
                    bytes = frame.len(),
                    "dropping undecodable payload"
                );
                return Ok(DispatchResult::Dropped(DropReason::MalformedPayload(error)));
            }
        };
        debug!(
            target: DISPATCH_TARGET,
            id = %request.id,
            method = %request.method,
            "request received"
        );

        let Some((method, handler)) = self.registry.resolve(&request.method) else {
            debug!(
                target: DISPATCH_TARGET,
                id = %request.id,
                method = %request.method,
                "no handler registered; dropping request"
            );
            return Ok(DispatchResult::Dropped(DropReason::UnknownMethod {
                id: request.id,
                method: request.method,
            }));
        };

        let result = match invoke(handler, &request) {
            Ok(result) => result,
            Err(error) => return Ok(handler_failed(request.id, method, error)),
        };

        let response = ResponseMessage::new(request.id, result);
        match writer.write_response(&response) {
            Ok(bytes) => Ok(DispatchResult::Dispatched {
                id: response.id,
                method,
                bytes,
            }),
            Err(DispatchError::SerializeResponse(source)) => Ok(handler_failed(
                response.id,
                method,
                HandlerError::SerializeResult(source),
            )),
            Err(error) => Err(error),
        }
    }
}

/// Runs the handler, converting a panic into a [`HandlerError`].
fn invoke(handler: &dyn Handler, request: &RequestMessage) -> Result<Value, HandlerError> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request)))
        .unwrap_or_else(|payload| Err(HandlerError::panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("non-string panic payload")
    }
}

fn handler_failed(id: RequestId, method: Method, error: HandlerError) -> DispatchResult {
    warn!(
        target: DISPATCH_TARGET,
        %id,
        %method,
        %error,
        "handler failed; dropping request"
    );
    DispatchResult::Dropped(DropReason::HandlerFailed { id, method, error })
}

/// Reads from the stream, retrying on interrupts.
fn read_with_retry<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
