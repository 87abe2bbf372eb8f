//! Request dispatch over a framed byte stream.
//!
//! The [`Dispatcher`] appends each chunk read from the input stream to its
//! receive buffer, then extracts and dispatches frames until the buffer holds
//! no complete frame. Each frame is decoded as a request, routed to the
//! registered handler, and answered with a framed response written straight
//! to the output stream:
//!
//! ```text
//! Content-Length: 28\r\n\r\n{"id":1,"method":"shutdown"}
//! Content-Length: 22\r\n\r\n{"id":1,"result":null}
//! ```
//!
//! Requests that cannot be answered (undecodable payloads, unknown methods,
//! failing handlers) are dropped silently. The reason is logged and reported
//! as a [`DispatchResult::Dropped`] value; the client sees no bytes.

mod dispatcher;
mod errors;
mod response;
#[cfg(test)]
mod tests;

pub use self::dispatcher::{DispatchResult, Dispatcher, SessionSummary};
pub use self::errors::{DispatchError, DropReason};
pub use self::response::ResponseWriter;

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
