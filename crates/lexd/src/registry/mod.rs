//! Method registry mapping method names to handlers.
//!
//! Supported methods form the closed [`Method`] enumeration. Handlers are
//! attached to methods once, at startup, through [`MethodRegistryBuilder`];
//! the built [`MethodRegistry`] is immutable and only answers lookups, so it
//! can be shared freely between threads.

mod errors;

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::protocol::RequestMessage;

pub use self::errors::HandlerError;

/// Tracing target for registry events.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Methods the server knows how to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// `initialize`: session handshake.
    Initialize,
    /// `shutdown`: the client is about to exit.
    Shutdown,
    /// `textDocument/completion`: completion candidates.
    Completion,
}

impl Method {
    /// Every supported method.
    pub const ALL: [Self; 3] = [Self::Initialize, Self::Shutdown, Self::Completion];

    /// Resolves a wire method name. Names are case-sensitive.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str() == name)
    }

    /// Wire name of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Shutdown => "shutdown",
            Self::Completion => "textDocument/completion",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Produces the result for one request.
///
/// Handlers never touch the output stream; the dispatch loop owns framing and
/// writes the returned value as the response `result`.
pub trait Handler: Send + Sync {
    /// Answers `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] when no result can be produced. The dispatch
    /// loop then drops the request without responding.
    fn handle(&self, request: &RequestMessage) -> Result<Value, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&RequestMessage) -> Result<Value, HandlerError> + Send + Sync,
{
    fn handle(&self, request: &RequestMessage) -> Result<Value, HandlerError> {
        self(request)
    }
}

/// A handler with strongly typed parameters and output.
///
/// Wrap implementations in [`Typed`] (or register them with
/// [`MethodRegistryBuilder::register_typed`]) to use them as a [`Handler`].
/// Absent `params` are decoded from JSON `null`, so `Option<_>` or
/// [`serde_json::Value`] parameter types accept requests without parameters.
pub trait TypedHandler: Send + Sync {
    /// Parameter shape decoded from the request `params`.
    type Params: DeserializeOwned;
    /// Result shape serialised into the response.
    type Output: Serialize;

    /// Answers a request with decoded parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] when no result can be produced.
    fn call(&self, params: Self::Params) -> Result<Self::Output, HandlerError>;
}

/// Adapter exposing a [`TypedHandler`] as a [`Handler`].
#[derive(Debug, Clone)]
pub struct Typed<H>(pub H);

impl<H: TypedHandler> Handler for Typed<H> {
    fn handle(&self, request: &RequestMessage) -> Result<Value, HandlerError> {
        let raw = request.params.clone().unwrap_or(Value::Null);
        let params = serde_json::from_value(raw).map_err(HandlerError::InvalidParams)?;
        let output = self.0.call(params)?;
        serde_json::to_value(output).map_err(HandlerError::SerializeResult)
    }
}

/// Immutable method-to-handler table.
pub struct MethodRegistry {
    handlers: HashMap<Method, Box<dyn Handler>>,
}

impl MethodRegistry {
    /// Starts an empty registry.
    #[must_use]
    pub fn builder() -> MethodRegistryBuilder {
        MethodRegistryBuilder::default()
    }

    /// Finds the handler registered for the wire method `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn Handler> {
        self.resolve(name).map(|(_, handler)| handler)
    }

    /// Finds the method and handler registered for `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<(Method, &dyn Handler)> {
        let method = Method::parse(name)?;
        self.handlers
            .get(&method)
            .map(|handler| (method, handler.as_ref()))
    }

    /// Registered methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().copied().collect();
        methods.sort();
        methods
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true when no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

/// Collects handlers before the registry is frozen.
#[derive(Default)]
pub struct MethodRegistryBuilder {
    handlers: HashMap<Method, Box<dyn Handler>>,
}

impl MethodRegistryBuilder {
    /// Attaches `handler` to `method`, replacing any earlier registration.
    #[must_use]
    pub fn register(mut self, method: Method, handler: impl Handler + 'static) -> Self {
        if self.handlers.insert(method, Box::new(handler)).is_some() {
            debug!(target: REGISTRY_TARGET, %method, "replacing registered handler");
        }
        self
    }

    /// Attaches a typed handler to `method`.
    #[must_use]
    pub fn register_typed(self, method: Method, handler: impl TypedHandler + 'static) -> Self {
        self.register(method, Typed(handler))
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> MethodRegistry {
        let registry = MethodRegistry {
            handlers: self.handlers,
        };
        debug!(
            target: REGISTRY_TARGET,
            methods = ?registry.methods(),
            "method registry built"
        );
        registry
    }
}

impl fmt::Debug for MethodRegistryBuilder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MethodRegistryBuilder")
            .field("methods", &self.handlers.len())
            .finish()
    }
}
