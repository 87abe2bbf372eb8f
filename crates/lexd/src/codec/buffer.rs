//! Accumulating receive buffer owned by the dispatch loop.

use tracing::debug;

use super::{CODEC_TARGET, FrameDecode, HEADER_SEPARATOR, find, try_extract_frame};

/// Where the buffer stands between extraction attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// No complete header block has arrived yet.
    WaitingForHeader,
    /// A header block is buffered but its payload is still arriving.
    WaitingForPayload,
    /// Payload bytes of an oversized frame are being skipped.
    Discarding {
        /// Bytes still to skip.
        remaining: usize,
    },
}

/// Bytes received from the input stream but not yet consumed as frames.
///
/// After every drain cycle the buffer holds at most one partial frame at its
/// tail. When an oversized frame is rejected, its payload is dropped as it
/// arrives rather than being buffered. Input that never forms a header is
/// dropped in [`MAX_HEADER_BYTES`](super::MAX_HEADER_BYTES) steps, so a drained
/// buffer waiting for a header never exceeds that size.
#[derive(Debug)]
pub struct ReceiveBuffer {
    bytes: Vec<u8>,
    discard: usize,
    limit: usize,
}

impl ReceiveBuffer {
    /// Creates an empty buffer accepting payloads of at most `limit` bytes.
    #[must_use]
    pub const fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            discard: 0,
            limit,
        }
    }

    /// Appends a freshly read chunk.
    pub fn extend(&mut self, chunk: &[u8]) {
        let skipped = self.discard.min(chunk.len());
        self.discard -= skipped;
        if let Some(rest) = chunk.get(skipped..) {
            self.bytes.extend_from_slice(rest);
        }
    }

    /// Pulls the next frame, if one is complete.
    ///
    /// Callers loop until [`FrameDecode::Incomplete`] to drain every frame
    /// carried by the latest chunk.
    pub fn next_frame(&mut self) -> FrameDecode {
        let decoded = try_extract_frame(&mut self.bytes, self.limit);
        if let FrameDecode::Oversized { declared, .. } = decoded {
            let available = declared.min(self.bytes.len());
            self.bytes.drain(..available);
            self.discard = declared - available;
            debug!(
                target: CODEC_TARGET,
                declared,
                pending = self.discard,
                "skipping oversized frame payload"
            );
        }
        decoded
    }

    /// Current position in the header/payload cycle.
    #[must_use]
    pub fn state(&self) -> BufferState {
        if self.discard > 0 {
            BufferState::Discarding {
                remaining: self.discard,
            }
        } else if find(&self.bytes, HEADER_SEPARATOR).is_some() {
            BufferState::WaitingForPayload
        } else {
            BufferState::WaitingForHeader
        }
    }

    /// Number of buffered bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when nothing is buffered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Buffered bytes, for diagnostics.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}
