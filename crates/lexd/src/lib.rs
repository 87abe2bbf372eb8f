//! A minimal language server speaking framed JSON requests over stdio.
//!
//! Clients write requests to standard input as frames of the form
//! `Content-Length: <N>\r\n\r\n<N bytes of JSON>` and read framed responses
//! from standard output. The crate is split along the path a request takes:
//!
//! - [`codec`] extracts frames from the receive buffer and encodes responses.
//! - [`protocol`] decodes request payloads and serialises responses.
//! - [`registry`] maps method names to handlers.
//! - [`dispatch`] drives the read, extract, handle, respond loop.
//! - [`handlers`] holds the shipped `initialize`, `shutdown` and
//!   `textDocument/completion` handlers.
//!
//! [`bootstrap_with`] ties these together with configuration from
//! [`lexd_config`], structured telemetry and health reporting, and returns a
//! [`Server`] ready to serve stdio. Requests that cannot be answered are
//! dropped without a response; the reason is logged to standard error, which
//! never carries protocol traffic.

mod bootstrap;
pub mod codec;
pub mod dispatch;
pub mod handlers;
mod health;
pub mod protocol;
pub mod registry;
pub mod telemetry;

use std::sync::Arc;

use thiserror::Error;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Server, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use dispatch::{DispatchError, SessionSummary};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

/// Errors ending a server run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The server could not start.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The session ended on a stream failure.
    #[error("session failed: {0}")]
    Session(#[from] DispatchError),
}

/// Loads configuration from the environment and serves stdio until the input
/// closes.
///
/// # Errors
///
/// Returns a [`RunError`] when bootstrap fails or a stream fails mid-session.
pub fn run() -> Result<SessionSummary, RunError> {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let server = bootstrap_with(&SystemConfigLoader, reporter)?;
    Ok(server.serve_stdio()?)
}

#[cfg(test)]
mod tests;
