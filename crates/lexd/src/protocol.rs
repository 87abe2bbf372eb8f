//! Request and response payloads carried inside frames.
//!
//! Requests are parsed leniently: only `id` and `method` are required, and
//! `params` stays an opaque JSON value until a handler decodes it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Correlation identifier copied from a request into its response.
///
/// Any JSON number is accepted, including integers beyond `i64` and values
/// with a fraction or exponent, and is echoed back as the same number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(Number),
    /// String identifier.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(formatter, "{value}"),
            Self::String(value) => write!(formatter, "{value:?}"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for RequestId {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RequestMessage {
    /// Protocol version announced by the client, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Identifier echoed in the response.
    pub id: RequestId,
    /// Method name used to select a handler.
    pub method: String,
    /// Handler parameters, opaque to the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestMessage {
    /// Builds a request without the version marker.
    #[must_use]
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: None,
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Parses a frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Empty`] for an empty payload and
    /// [`MessageError::Malformed`] when the payload is not a JSON object with
    /// `id` and `method`.
    pub fn parse(payload: &[u8]) -> Result<Self, MessageError> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Err(MessageError::Empty);
        }
        serde_json::from_slice(payload).map_err(MessageError::from)
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResponseMessage {
    /// Identifier of the originating request.
    pub id: RequestId,
    /// Handler output.
    pub result: Value,
}

impl ResponseMessage {
    /// Pairs a handler result with the request identifier.
    #[must_use]
    pub fn new(id: RequestId, result: Value) -> Self {
        Self { id, result }
    }

    /// Serialises the response as a compact JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be serialised.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Reasons a payload could not become a [`RequestMessage`].
#[derive(Debug, Error)]
pub enum MessageError {
    /// The payload held no JSON value.
    #[error("empty request payload")]
    Empty,
    /// The payload was not valid JSON or lacked required fields.
    #[error("malformed request payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
