//! MCP tool implementations for thermostat control and weather lookup
//!
//! Every tool call ends here: arguments are decoded, identifiers resolved,
//! the backend called and the outcome rendered as text. Errors never escape
//! this layer; they are rendered as `Error: ...` text instead.

pub mod thermostat;
pub mod weather;

use crate::client::{ThermostatClient, WeatherClient};
use crate::error::{HomeAutomationError, Result};
use crate::log_structured_error;
use crate::services::id_resolver::ThermostatIdResolver;
use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub const THERMOSTAT_TOOLS: &[&str] = &[
    "list_thermostats",
    "get_thermostat_status",
    "set_thermostat_temperature",
    "get_thermostat_history",
    "set_thermostat_mode",
];

pub const WEATHER_TOOLS: &[&str] = &[
    "get_current_weather",
    "get_weather_forecast",
    "get_weather_alerts",
];

pub const WEATHER_UNAVAILABLE: &str =
    "Weather tools are not available. Please configure WEATHER_API_KEY.";

/// Tool metadata as advertised through `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new<A: JsonSchema>(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: input_schema::<A>(),
        }
    }
}

/// Text result of a tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    /// Render a handler outcome, turning any error into `Error: ...`
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(format!("Error: {e}")),
        }
    }
}

/// Arguments of tools that take none
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// JSON schema for a tool's argument struct, with subschemas inlined
pub fn input_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.inline_subschemas = true;
            s.option_add_null_type = false;
        })
        .into_generator();
    let schema = generator.into_root_schema_for::<T>();

    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.remove("definitions");
        obj.entry("properties").or_insert_with(|| json!({}));
    }
    value
}

/// Decode tool arguments; a missing argument object counts as `{}`
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| HomeAutomationError::invalid_input(format!("Invalid arguments: {e}")))
}

/// Accept an identifier given either as a string or as a bare number
pub fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => format_number(f),
    })
}

/// Format a float the way a human expects to read it: `72.0`, `68.5`, `-3.25`
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Shared dependencies of every tool handler
#[derive(Clone)]
pub struct ToolContext {
    /// Thermostat backend (mock or SDM)
    pub thermostats: Arc<dyn ThermostatClient>,

    /// Alias cache populated by listings
    pub resolver: Arc<ThermostatIdResolver>,

    /// Weather client, absent without an API key
    pub weather: Option<Arc<WeatherClient>>,
}

impl ToolContext {
    pub fn new(
        thermostats: Arc<dyn ThermostatClient>,
        resolver: Arc<ThermostatIdResolver>,
        weather: Option<Arc<WeatherClient>>,
    ) -> Self {
        Self {
            thermostats,
            resolver,
            weather,
        }
    }

    /// Tools currently available; weather tools only with a weather client
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut tools = thermostat::tool_definitions();
        if self.weather.is_some() {
            tools.extend(weather::tool_definitions());
        }
        debug!("Registered {} tools", tools.len());
        tools
    }

    /// Dispatch a tool call by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> ToolResponse {
        debug!("Tool called: {name} with arguments: {arguments}");

        let result = if THERMOSTAT_TOOLS.contains(&name) {
            thermostat::handle(self, name, arguments).await
        } else if WEATHER_TOOLS.contains(&name) {
            match &self.weather {
                Some(client) => weather::handle(client, name, arguments).await,
                None => return ToolResponse::error(WEATHER_UNAVAILABLE),
            }
        } else {
            return ToolResponse::error(format!("Unknown tool: {name}"));
        };

        if let Err(e) = &result {
            log_structured_error!(e, "tools", name);
        }
        ToolResponse::from_result(result)
    }

    /// Release every outbound client
    pub async fn close(&self) {
        self.thermostats.close().await;
        if let Some(weather) = &self.weather {
            weather.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(72.0, "72.0")]
    #[case(68.5, "68.5")]
    #[case(-3.25, "-3.25")]
    #[case(0.0, "0.0")]
    #[case(71.6, "71.6")]
    fn test_format_number(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_number(value), expected);
    }

    #[test]
    fn test_response_from_result() {
        assert_eq!(
            ToolResponse::from_result(Ok("done".to_string())),
            ToolResponse::text("done")
        );
        let err = ToolResponse::from_result(Err(HomeAutomationError::not_found("x")));
        assert!(err.is_error);
        assert_eq!(err.text, "Error: Not found: x");
    }

    #[test]
    fn test_parse_arguments_null_is_empty_object() {
        let _: NoArgs = parse_arguments(Value::Null).unwrap();
    }

    #[test]
    fn test_no_args_schema_is_object() {
        let schema = input_schema::<NoArgs>();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].as_object().unwrap().is_empty());
    }
}
