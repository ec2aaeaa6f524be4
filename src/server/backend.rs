//! Home automation backend for the MCP framework
//!
//! Implements `McpBackend` on top of [`ToolContext`]. The framework owns
//! JSON-RPC routing; this module only lists tools and turns tool responses
//! into protocol results. Tool failures are results with `isError` set, never
//! protocol errors.

use crate::client::{create_thermostat_client, create_weather_client};
use crate::config::ServerConfig;
use crate::error::{HomeAutomationError, Result};
use crate::services::ThermostatIdResolver;
use crate::tools::{ToolContext, ToolDefinition, ToolResponse};
use async_trait::async_trait;
use pulseengine_mcp_protocol::{
    CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, GetPromptResult,
    Implementation, ListPromptsResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ReadResourceRequestParam, ReadResourceResult,
    ServerCapabilities, ServerInfo, Tool,
};
use pulseengine_mcp_server::backend::{BackendError, McpBackend};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const SERVER_NAME: &str = "home-automation-mcp";

const INSTRUCTIONS: &str = "Home automation server. Call list_thermostats first: \
it assigns each thermostat a number (1, 2, ...) and a short ID that the other \
thermostat tools accept. Temperatures are reported in Fahrenheit.";

/// Convert HomeAutomationError to BackendError
impl From<HomeAutomationError> for BackendError {
    fn from(err: HomeAutomationError) -> Self {
        match err {
            HomeAutomationError::Config(msg) => BackendError::configuration(msg),
            HomeAutomationError::Connection(msg) => BackendError::connection(msg),
            other => BackendError::internal(other.to_string()),
        }
    }
}

/// MCP backend serving the thermostat and weather tools
#[derive(Clone)]
pub struct HomeAutomationBackend {
    tools: ToolContext,
}

impl HomeAutomationBackend {
    pub fn new(tools: ToolContext) -> Self {
        Self { tools }
    }

    /// Create the outbound clients selected by the configuration
    pub async fn from_config(config: &ServerConfig) -> Result<Self> {
        let thermostats = create_thermostat_client(config)?;
        info!("🌡️ Thermostat backend: {}", thermostats.backend_name());

        let weather = match create_weather_client(config) {
            Ok(weather) => weather,
            Err(e) => {
                thermostats.close().await;
                return Err(e);
            }
        };
        if weather.is_some() {
            info!("🌤️ Weather tools enabled");
        } else {
            warn!("Weather tools disabled (WEATHER_API_KEY not set)");
        }

        Ok(Self::new(ToolContext::new(
            thermostats,
            Arc::new(ThermostatIdResolver::new()),
            weather,
        )))
    }

    /// Tool layer behind this backend; closing it releases the HTTP clients
    pub fn tools(&self) -> &ToolContext {
        &self.tools
    }
}

fn to_tool(definition: ToolDefinition) -> Tool {
    Tool {
        name: definition.name,
        description: definition.description,
        input_schema: definition.input_schema,
    }
}

/// Text content with the error flag carried over
pub fn to_call_result(response: ToolResponse) -> CallToolResult {
    if response.is_error {
        CallToolResult::error_text(response.text)
    } else {
        CallToolResult::success(vec![Content::text(response.text)])
    }
}

#[async_trait]
impl McpBackend for HomeAutomationBackend {
    type Error = BackendError;
    type Config = ServerConfig;

    async fn initialize(config: Self::Config) -> std::result::Result<Self, Self::Error> {
        info!("🚀 Initializing home automation backend");
        Self::from_config(&config).await.map_err(BackendError::from)
    }

    fn get_server_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn health_check(&self) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    async fn list_tools(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListToolsResult, Self::Error> {
        let tools: Vec<Tool> = self
            .tools
            .tool_definitions()
            .into_iter()
            .map(to_tool)
            .collect();
        debug!("📋 Listed {} tools", tools.len());

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParam,
    ) -> std::result::Result<CallToolResult, Self::Error> {
        debug!("⚡ Calling tool: {}", params.name);
        let arguments = params.arguments.unwrap_or(Value::Null);
        let response = self.tools.call_tool(&params.name, arguments).await;
        Ok(to_call_result(response))
    }

    async fn list_resources(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListResourcesResult, Self::Error> {
        Err(BackendError::not_supported("This server only provides tools"))
    }

    async fn read_resource(
        &self,
        params: ReadResourceRequestParam,
    ) -> std::result::Result<ReadResourceResult, Self::Error> {
        Err(BackendError::not_supported(format!(
            "Unknown resource: {}",
            params.uri
        )))
    }

    async fn list_prompts(
        &self,
        _params: PaginatedRequestParam,
    ) -> std::result::Result<ListPromptsResult, Self::Error> {
        Err(BackendError::not_supported("This server only provides tools"))
    }

    async fn get_prompt(
        &self,
        params: GetPromptRequestParam,
    ) -> std::result::Result<GetPromptResult, Self::Error> {
        Err(BackendError::not_supported(format!(
            "Unknown prompt: {}",
            params.name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockThermostatClient;
    use serde_json::json;

    fn backend() -> HomeAutomationBackend {
        HomeAutomationBackend::new(ToolContext::new(
            Arc::new(MockThermostatClient::new()),
            Arc::new(ThermostatIdResolver::new()),
            None,
        ))
    }

    fn call(name: &str, arguments: Value) -> CallToolRequestParam {
        serde_json::from_value(json!({"name": name, "arguments": arguments})).unwrap()
    }

    #[test]
    fn test_tool_response_maps_to_text_content() {
        let ok = serde_json::to_value(to_call_result(ToolResponse::text("done"))).unwrap();
        assert_eq!(ok["content"][0]["type"], "text");
        assert_eq!(ok["content"][0]["text"], "done");
        assert_eq!(ok["isError"], false);

        let failed =
            serde_json::to_value(to_call_result(ToolResponse::error("Error: boom"))).unwrap();
        assert_eq!(failed["content"][0]["text"], "Error: boom");
        assert_eq!(failed["isError"], true);
    }

    #[test]
    fn test_server_info_carries_instructions() {
        let info = backend().get_server_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info
            .instructions
            .as_deref()
            .unwrap_or_default()
            .contains("list_thermostats"));
    }

    #[tokio::test]
    async fn test_list_tools_without_weather() {
        let listed = backend()
            .list_tools(serde_json::from_value(json!({})).unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = listed.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, crate::tools::THERMOSTAT_TOOLS.to_vec());
    }

    #[tokio::test]
    async fn test_tool_failures_are_results() {
        let backend = backend();

        let result = backend
            .call_tool(call("get_thermostat_status", json!({"thermostat_id": "9"})))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        let result = backend.call_tool(call("open_garage", json!({}))).await.unwrap();
        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["content"][0]["text"], "Unknown tool: open_garage");

        let result = backend
            .call_tool(call("get_current_weather", json!({"location": "London"})))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_call_without_arguments() {
        let params: CallToolRequestParam =
            serde_json::from_value(json!({"name": "list_thermostats"})).unwrap();
        let result = backend().call_tool(params).await.unwrap();
        assert_eq!(result.is_error, Some(false));
    }
}
