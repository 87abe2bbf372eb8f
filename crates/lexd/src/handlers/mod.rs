//! Method handlers shipped with the server.
//!
//! Handlers are plain [`TypedHandler`] implementations. They compute a result
//! value and leave framing and output to the dispatch loop.

mod completion;
mod initialize;

use serde_json::Value;

use crate::registry::{HandlerError, Method, MethodRegistry, TypedHandler};

pub use self::completion::{CompletionHandler, WordList, WordListError};
pub use self::initialize::{InitializeHandler, InitializeParams};

/// Tracing target for handler events.
pub(crate) const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handlers");

/// Answers `shutdown` with `null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShutdownHandler;

impl TypedHandler for ShutdownHandler {
    type Params = Value;
    type Output = ();

    fn call(&self, _params: Self::Params) -> Result<Self::Output, HandlerError> {
        Ok(())
    }
}

/// Builds the registry of every shipped handler.
#[must_use]
pub fn default_registry(words: &WordList) -> MethodRegistry {
    MethodRegistry::builder()
        .register_typed(Method::Initialize, InitializeHandler::new())
        .register_typed(Method::Shutdown, ShutdownHandler)
        .register_typed(Method::Completion, CompletionHandler::new(words))
        .build()
}
