//! `initialize` handshake.

use lsp_types::{
    ClientInfo, CompletionOptions, InitializeResult, ServerCapabilities, ServerInfo,
    TextDocumentSyncCapability, TextDocumentSyncKind,
};
use serde::Deserialize;
use tracing::info;

use crate::registry::{HandlerError, TypedHandler};

use super::HANDLER_TARGET;

/// The subset of `initialize` parameters the server reads.
///
/// Unknown fields are ignored so that any client's handshake is accepted.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Process id of the client, if it reported one.
    #[serde(default)]
    pub process_id: Option<u32>,
    /// Client name and version.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Advertises full-document sync and completion support.
#[derive(Debug, Clone)]
pub struct InitializeHandler {
    result: InitializeResult,
}

impl InitializeHandler {
    /// Builds the handler with the server's static capabilities.
    #[must_use]
    pub fn new() -> Self {
        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(
                TextDocumentSyncKind::FULL,
            )),
            completion_provider: Some(CompletionOptions::default()),
            ..ServerCapabilities::default()
        };
        Self {
            result: InitializeResult {
                capabilities,
                server_info: Some(ServerInfo {
                    name: env!("CARGO_PKG_NAME").to_owned(),
                    version: Some(env!("CARGO_PKG_VERSION").to_owned()),
                }),
            },
        }
    }
}

impl Default for InitializeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TypedHandler for InitializeHandler {
    type Params = Option<InitializeParams>;
    type Output = InitializeResult;

    fn call(&self, params: Self::Params) -> Result<Self::Output, HandlerError> {
        let params = params.unwrap_or_default();
        info!(
            target: HANDLER_TARGET,
            client = params.client_info.as_ref().map(|client| client.name.as_str()),
            process_id = params.process_id,
            "client initialising"
        );
        Ok(self.result.clone())
    }
}
