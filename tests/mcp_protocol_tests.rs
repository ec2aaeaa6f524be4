//! MCP Protocol Compliance Tests
//!
//! Sends JSON-RPC requests through the framework handler that backs the
//! stdio transport, and checks the wire shape of each response.

use home_automation_mcp::client::{DummyNestClient, ThermostatClient};
use home_automation_mcp::server::{create_handler, HomeAutomationBackend, SERVER_NAME};
use home_automation_mcp::services::ThermostatIdResolver;
use home_automation_mcp::tools::{ToolContext, THERMOSTAT_TOOLS, WEATHER_UNAVAILABLE};
use pulseengine_mcp_protocol::Request;
use pulseengine_mcp_server::GenericServerHandler;
use serde_json::{json, Value};
use std::sync::Arc;

mod common;
use common::{MockDummyApi, TEST_TIMEOUT};

struct Harness {
    _api: MockDummyApi,
    handler: GenericServerHandler<HomeAutomationBackend>,
}

impl Harness {
    async fn start() -> Self {
        let api = MockDummyApi::start().await;
        let thermostats: Arc<dyn ThermostatClient> =
            Arc::new(DummyNestClient::new(&api.url(), TEST_TIMEOUT).unwrap());
        let tools = ToolContext::new(thermostats, Arc::new(ThermostatIdResolver::new()), None);
        let handler = create_handler(HomeAutomationBackend::new(tools))
            .await
            .unwrap();

        Self { _api: api, handler }
    }

    async fn call(&self, id: u64, method: &str, params: Value) -> Value {
        let request: Request = serde_json::from_value(
            json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}),
        )
        .unwrap();
        let response = self.handler.handle_request(request).await.unwrap();
        let response = serde_json::to_value(response).unwrap();
        assert_eq!(response["id"], id);
        response
    }
}

#[tokio::test]
async fn test_initialize_handshake() {
    let harness = Harness::start().await;
    let response = harness
        .call(
            1,
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test-client", "version": "0.0.1"}
            }),
        )
        .await;

    assert_eq!(response["jsonrpc"], "2.0");
    let result = &response["result"];
    assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["instructions"]
        .as_str()
        .unwrap()
        .contains("list_thermostats"));
}

#[tokio::test]
async fn test_tools_list_without_weather() {
    let harness = Harness::start().await;
    let response = harness.call(2, "tools/list", json!({})).await;

    let tools = response["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, THERMOSTAT_TOOLS.to_vec());
    for tool in tools {
        assert_eq!(tool["inputSchema"]["type"], "object", "{}", tool["name"]);
        assert!(!tool["description"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_tools_call_returns_text_content() {
    let harness = Harness::start().await;
    let response = harness
        .call(
            3,
            "tools/call",
            json!({"name": "list_thermostats", "arguments": {}}),
        )
        .await;

    let result = &response["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["type"], "text");
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("Living Room"));
}

#[tokio::test]
async fn test_tool_failure_is_a_result_not_a_protocol_error() {
    let harness = Harness::start().await;
    let response = harness
        .call(
            4,
            "tools/call",
            json!({"name": "get_thermostat_status", "arguments": {"thermostat_id": "9"}}),
        )
        .await;

    assert!(response.get("error").map_or(true, Value::is_null));
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["content"][0]["text"],
        "Error: Not found: Thermostat 9 not found"
    );
}

#[tokio::test]
async fn test_weather_tool_without_key_is_an_error_result() {
    let harness = Harness::start().await;
    let response = harness
        .call(
            5,
            "tools/call",
            json!({"name": "get_current_weather", "arguments": {"location": "London"}}),
        )
        .await;

    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["content"][0]["text"],
        WEATHER_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_alias_flow_across_requests() {
    let harness = Harness::start().await;
    harness
        .call(
            6,
            "tools/call",
            json!({"name": "list_thermostats", "arguments": {}}),
        )
        .await;

    let response = harness
        .call(
            7,
            "tools/call",
            json!({"name": "get_thermostat_history", "arguments": {"thermostat_id": "2", "hours": 6}}),
        )
        .await;
    assert_eq!(response["result"]["isError"], false);
    assert!(response["result"]["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("**Temperature History** (6 entries, last 6 hours)"));
}

#[tokio::test]
async fn test_unknown_method() {
    let harness = Harness::start().await;
    let response = harness.call(8, "thermostats/reboot", json!({})).await;
    assert!(response["error"].is_object());
    assert!(response.get("result").map_or(true, Value::is_null));
}
