//! MCP server over stdio
//!
//! JSON-RPC framing and method routing come from the pulseengine MCP
//! framework. [`HomeAutomationBackend`] supplies the tools.

pub mod backend;

pub use backend::{HomeAutomationBackend, SERVER_NAME};

use crate::error::{HomeAutomationError, Result};
use pulseengine_mcp_auth::{AuthConfig, AuthenticationManager};
use pulseengine_mcp_protocol::{Error as ProtocolError, Response};
use pulseengine_mcp_server::{middleware::MiddlewareStack, GenericServerHandler};
use pulseengine_mcp_transport::{create_transport, Transport, TransportConfig};
use std::sync::Arc;
use tracing::{error, info};

/// Wrap the backend in the framework's request handler.
///
/// Stdio is a local pipe to a single client, so authentication stays off.
pub async fn create_handler(
    backend: HomeAutomationBackend,
) -> Result<GenericServerHandler<HomeAutomationBackend>> {
    let auth_config = AuthConfig {
        enabled: false,
        ..Default::default()
    };
    let auth_manager = AuthenticationManager::new(auth_config)
        .await
        .map_err(|e| HomeAutomationError::config(e.to_string()))?;

    Ok(GenericServerHandler::new(
        Arc::new(backend),
        Arc::new(auth_manager),
        MiddlewareStack::new(),
    ))
}

/// Serve requests on stdin and stdout until the client closes its end
pub async fn serve_stdio(handler: GenericServerHandler<HomeAutomationBackend>) -> Result<()> {
    let mut transport: Box<dyn Transport> = create_transport(TransportConfig::Stdio)
        .map_err(|e| HomeAutomationError::connection(e.to_string()))?;
    info!("MCP server listening on stdio");

    transport
        .start(Box::new(move |req| {
            let handler = handler.clone();
            Box::pin(async move {
                handler.handle_request(req).await.unwrap_or_else(|e| {
                    error!("Request handling error: {e}");
                    Response {
                        jsonrpc: "2.0".to_string(),
                        id: Default::default(),
                        result: None,
                        error: Some(ProtocolError::internal_error(e.to_string())),
                    }
                })
            })
        }))
        .await
        .map_err(|e| HomeAutomationError::connection(e.to_string()))?;

    info!("MCP client disconnected");
    Ok(())
}
