//! `Content-Length` framing for the stdio byte stream.
//!
//! Every message travels as a header block, a blank line, and a payload of
//! exactly the declared number of bytes:
//!
//! ```text
//! Content-Length: <length>\r\n
//! \r\n
//! <payload>
//! ```
//!
//! Input arrives in arbitrary chunks, so extraction is re-entrant: callers
//! append to a [`ReceiveBuffer`] and pull frames until the codec reports
//! [`FrameDecode::Incomplete`]. A chunk may hold part of a frame, exactly one
//! frame, or several frames back to back.

mod buffer;
mod errors;

pub use self::buffer::{BufferState, ReceiveBuffer};
pub use self::errors::FrameError;

/// Tracing target for framing events.
pub(crate) const CODEC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::codec");

/// Longest header accepted before the codec abandons it and resynchronises.
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

const CONTENT_LENGTH_PREFIX: &str = "Content-Length: ";
const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";
const LINE_END: &[u8] = b"\r\n";

/// A complete payload lifted out of the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    /// Wraps an already extracted payload.
    #[must_use]
    pub const fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Payload bytes, exactly as declared by the header.
    #[must_use]
    pub const fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns true for a zero-length payload.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consumes the frame, yielding its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

/// Outcome of a single extraction attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameDecode {
    /// A whole frame was removed from the front of the buffer.
    Frame(Frame),
    /// More input is required; the buffer was left untouched.
    Incomplete,
    /// Bytes at the front of the buffer could not start a frame and have been
    /// discarded up to the next `Content-Length` line.
    Malformed(FrameError),
    /// The header declared more than `limit` bytes. The header block has been
    /// discarded and the payload must be skipped as it arrives.
    Oversized {
        /// Length announced by the header.
        declared: usize,
        /// Configured ceiling.
        limit: usize,
    },
}

/// Encodes `payload` as a single frame.
///
/// The declared length counts bytes, so multi-byte UTF-8 text is measured
/// correctly.
///
/// # Examples
///
/// ```rust
/// let frame = lexd::codec::encode("héllo".as_bytes());
/// assert_eq!(frame, b"Content-Length: 6\r\n\r\nh\xc3\xa9llo");
/// ```
#[must_use]
pub fn encode(payload: &[u8]) -> Vec<u8> {
    let header = format!("{CONTENT_LENGTH_PREFIX}{}\r\n\r\n", payload.len());
    let mut frame = Vec::with_capacity(header.len() + payload.len());
    frame.extend_from_slice(header.as_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Attempts to remove one frame from the front of `buffer`.
///
/// The frame header is the first `Content-Length: <digits>` line. Header lines
/// that precede it in the same block (such as `Content-Type`) are ignored, as
/// are lines between it and the blank line that ends the block. When a frame
/// is returned, the header, the separator, and the payload are drained from
/// `buffer`.
///
/// Bytes that cannot start a frame are reported as
/// [`FrameDecode::Malformed`] and drained up to the next `Content-Length`
/// line, so one bad header never stalls the frames behind it. A header that
/// runs past [`MAX_HEADER_BYTES`] without completing is treated the same way.
/// Every scan looks at no more than [`MAX_HEADER_BYTES`] of the buffer.
pub fn try_extract_frame(buffer: &mut Vec<u8>, limit: usize) -> FrameDecode {
    let prefix = CONTENT_LENGTH_PREFIX.as_bytes();
    let search_window = head(buffer, MAX_HEADER_BYTES + prefix.len() - 1);
    let Some(start) = find(search_window, prefix) else {
        if buffer.len() <= MAX_HEADER_BYTES {
            return FrameDecode::Incomplete;
        }
        buffer.drain(..MAX_HEADER_BYTES);
        return FrameDecode::Malformed(FrameError::HeaderTooLarge {
            limit: MAX_HEADER_BYTES,
        });
    };

    let (skipped, header) = buffer.split_at(start);
    if let Some(error) = reject_leading_bytes(skipped) {
        buffer.drain(..start);
        return FrameDecode::Malformed(error);
    }

    let value_start = start + prefix.len();
    let rest = header.get(prefix.len()..).unwrap_or_default();
    let rest_len = rest.len();
    let window = head(rest, MAX_HEADER_BYTES);
    let Some(value_len) = find(window, LINE_END) else {
        return give_up_or_wait(buffer, rest_len, value_start);
    };
    let (value, after_value) = window.split_at(value_len);
    let declared = match parse_length(value) {
        Ok(declared) => declared,
        Err(error) => {
            buffer.drain(..value_start + value_len + LINE_END.len());
            return FrameDecode::Malformed(error);
        }
    };
    let Some(separator) = find(after_value, HEADER_SEPARATOR) else {
        return give_up_or_wait(buffer, rest_len, value_start);
    };
    let payload_start = value_start + value_len + separator + HEADER_SEPARATOR.len();

    if declared > limit {
        buffer.drain(..payload_start);
        return FrameDecode::Oversized { declared, limit };
    }

    let Some(payload_bytes) = payload_start
        .checked_add(declared)
        .and_then(|payload_end| buffer.get(payload_start..payload_end))
    else {
        return FrameDecode::Incomplete;
    };
    let payload = payload_bytes.to_vec();
    buffer.drain(..payload_start + declared);
    FrameDecode::Frame(Frame::new(payload))
}

/// Classifies the bytes in front of a `Content-Length` line.
///
/// Complete header lines belong to the same block and are accepted. A blank
/// line means an earlier block ended without a length, and anything else is
/// stray data.
fn reject_leading_bytes(skipped: &[u8]) -> Option<FrameError> {
    if skipped.is_empty() {
        None
    } else if find(skipped, HEADER_SEPARATOR).is_some() {
        Some(FrameError::MissingContentLength)
    } else if skipped.ends_with(LINE_END) {
        None
    } else {
        Some(FrameError::UnexpectedBytes {
            len: skipped.len(),
        })
    }
}

/// Abandons a header that has outgrown [`MAX_HEADER_BYTES`], or waits for
/// the rest of it.
fn give_up_or_wait(buffer: &mut Vec<u8>, header_len: usize, value_start: usize) -> FrameDecode {
    if header_len <= MAX_HEADER_BYTES {
        return FrameDecode::Incomplete;
    }
    buffer.drain(..value_start);
    FrameDecode::Malformed(FrameError::HeaderTooLarge {
        limit: MAX_HEADER_BYTES,
    })
}

/// Parses a `Content-Length` value made of ASCII digits only.
fn parse_length(value: &[u8]) -> Result<usize, FrameError> {
    let invalid = || FrameError::invalid_content_length(String::from_utf8_lossy(value));
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    std::str::from_utf8(value)
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(invalid)
}

/// At most the first `len` bytes of `bytes`.
fn head(bytes: &[u8], len: usize) -> &[u8] {
    bytes.split_at(bytes.len().min(len)).0
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
