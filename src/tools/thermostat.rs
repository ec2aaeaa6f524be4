//! Thermostat tools
//!
//! - `list_thermostats` - list every thermostat and register its aliases
//! - `get_thermostat_status` - status block for one thermostat
//! - `set_thermostat_temperature` - change the target temperature
//! - `get_thermostat_history` - summary plus the most recent readings
//! - `set_thermostat_mode` - change the operating mode (SDM backend only)

use crate::client::{
    HistoryEntry, ModeSetResult, TemperatureSetResult, TemperatureUnit, ThermostatMode,
    ThermostatStatus,
};
use crate::error::{HomeAutomationError, Result};
use crate::services::id_resolver::shorten_device_id;
use crate::tools::{
    format_number, parse_arguments, string_or_number, NoArgs, ToolContext, ToolDefinition,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write;
use tracing::debug;

pub const MIN_FAHRENHEIT: f64 = 50.0;
pub const MAX_FAHRENHEIT: f64 = 90.0;
pub const MIN_CELSIUS: f64 = 10.0;
pub const MAX_CELSIUS: f64 = 32.2;
pub const DEFAULT_HISTORY_HOURS: u32 = 24;
pub const MAX_HISTORY_HOURS: u32 = 168;

/// Readings shown below the history summary
const RECENT_READINGS: usize = 10;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ThermostatIdArgs {
    /// Thermostat number (e.g., '1', '2') or short ID
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub thermostat_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetTemperatureArgs {
    /// Thermostat number (e.g., '1', '2') or short ID
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub thermostat_id: String,

    /// Target temperature (50-90 for Fahrenheit)
    pub temperature: f64,

    /// Temperature unit
    #[serde(default)]
    pub unit: TemperatureUnit,
}

fn default_hours() -> u32 {
    DEFAULT_HISTORY_HOURS
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HistoryArgs {
    /// Thermostat number (e.g., '1', '2') or short ID
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub thermostat_id: String,

    /// Number of hours of history (default: 24, max: 168)
    #[serde(default = "default_hours")]
    #[schemars(range(min = 1, max = 168))]
    pub hours: u32,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetModeArgs {
    /// Thermostat number (e.g., '1', '2') or short ID
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub thermostat_id: String,

    /// Operating mode
    pub mode: ThermostatMode,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new::<NoArgs>(
            "list_thermostats",
            "List all available thermostats in the home",
        ),
        ToolDefinition::new::<ThermostatIdArgs>(
            "get_thermostat_status",
            "Get the current status of a specific thermostat",
        ),
        ToolDefinition::new::<SetTemperatureArgs>(
            "set_thermostat_temperature",
            "Set the target temperature for a thermostat",
        ),
        ToolDefinition::new::<HistoryArgs>(
            "get_thermostat_history",
            "Get temperature history for a thermostat",
        ),
        ToolDefinition::new::<SetModeArgs>(
            "set_thermostat_mode",
            "Set the operating mode (heating, cooling, auto, off) of a thermostat",
        ),
    ]
}

/// Run a thermostat tool and render its text
pub async fn handle(ctx: &ToolContext, name: &str, arguments: Value) -> Result<String> {
    match name {
        "list_thermostats" => list_thermostats(ctx).await,
        "get_thermostat_status" => {
            let args: ThermostatIdArgs = parse_arguments(arguments)?;
            get_thermostat_status(ctx, args).await
        }
        "set_thermostat_temperature" => {
            let args: SetTemperatureArgs = parse_arguments(arguments)?;
            set_thermostat_temperature(ctx, args).await
        }
        "get_thermostat_history" => {
            let args: HistoryArgs = parse_arguments(arguments)?;
            get_thermostat_history(ctx, args).await
        }
        "set_thermostat_mode" => {
            let args: SetModeArgs = parse_arguments(arguments)?;
            set_thermostat_mode(ctx, args).await
        }
        other => Err(HomeAutomationError::invalid_input(format!(
            "Unknown tool: {other}"
        ))),
    }
}

async fn list_thermostats(ctx: &ToolContext) -> Result<String> {
    let thermostats = ctx.thermostats.list_thermostats().await?;
    for (idx, thermostat) in thermostats.iter().enumerate() {
        ctx.resolver.cache_identifiers(&thermostat.id, idx + 1).await;
    }
    debug!("Cached aliases for {} thermostats", thermostats.len());
    Ok(render_listing(&thermostats))
}

async fn get_thermostat_status(ctx: &ToolContext, args: ThermostatIdArgs) -> Result<String> {
    let full_id = ctx.resolver.resolve(&args.thermostat_id).await;
    let thermostat = ctx.thermostats.get_thermostat(&full_id).await?;
    Ok(render_status(&thermostat))
}

async fn set_thermostat_temperature(
    ctx: &ToolContext,
    args: SetTemperatureArgs,
) -> Result<String> {
    validate_temperature(args.temperature, args.unit)?;
    let full_id = ctx.resolver.resolve(&args.thermostat_id).await;
    let result = ctx
        .thermostats
        .set_temperature(&full_id, args.temperature, args.unit)
        .await?;
    Ok(render_temperature_set(&result, args.unit))
}

async fn get_thermostat_history(ctx: &ToolContext, args: HistoryArgs) -> Result<String> {
    validate_hours(args.hours)?;
    let full_id = ctx.resolver.resolve(&args.thermostat_id).await;
    let history = ctx.thermostats.get_history(&full_id, args.hours).await?;
    Ok(render_history(&history, args.hours))
}

async fn set_thermostat_mode(ctx: &ToolContext, args: SetModeArgs) -> Result<String> {
    let full_id = ctx.resolver.resolve(&args.thermostat_id).await;
    let result = ctx.thermostats.set_mode(&full_id, args.mode).await?;
    Ok(render_mode_set(&result))
}

/// Setpoints outside the range thermostats accept are rejected before any call
pub fn validate_temperature(temperature: f64, unit: TemperatureUnit) -> Result<()> {
    let (min, max) = match unit {
        TemperatureUnit::Fahrenheit => (MIN_FAHRENHEIT, MAX_FAHRENHEIT),
        TemperatureUnit::Celsius => (MIN_CELSIUS, MAX_CELSIUS),
    };
    if !temperature.is_finite() || temperature < min || temperature > max {
        return Err(HomeAutomationError::invalid_input(format!(
            "Temperature must be between {min} and {max} °{} (got {})",
            unit.symbol(),
            format_number(temperature)
        )));
    }
    Ok(())
}

pub fn validate_hours(hours: u32) -> Result<()> {
    if !(1..=MAX_HISTORY_HOURS).contains(&hours) {
        return Err(HomeAutomationError::invalid_input(format!(
            "Hours must be between 1 and {MAX_HISTORY_HOURS} (got {hours})"
        )));
    }
    Ok(())
}

pub fn render_listing(thermostats: &[ThermostatStatus]) -> String {
    if thermostats.is_empty() {
        return "No thermostats found.".to_string();
    }

    let mut out = String::from("**Available Thermostats:**\n\n");
    for (idx, t) in thermostats.iter().enumerate() {
        let idx = idx + 1;
        let display_name = if t.name.is_empty() {
            format!("Thermostat {idx}")
        } else {
            t.name.clone()
        };
        let _ = writeln!(
            out,
            "- **{display_name}** (use `{idx}` or `{}`)",
            shorten_device_id(&t.id)
        );
        let _ = writeln!(out, "  - Current: {}°F", format_number(t.current_temperature));
        let _ = writeln!(out, "  - Target: {}°F", format_number(t.target_temperature));
        let _ = writeln!(out, "  - Mode: {}", t.mode);
        let _ = writeln!(out, "  - Humidity: {}%", format_number(t.humidity));
        let _ = writeln!(out, "  - Status: {}\n", t.status);
    }
    out
}

pub fn render_status(t: &ThermostatStatus) -> String {
    let display_name = if t.name.is_empty() {
        "Thermostat"
    } else {
        t.name.as_str()
    };

    let mut out = format!(
        "**{display_name}** (ID: `{}`)\n\n",
        shorten_device_id(&t.id)
    );
    let _ = writeln!(
        out,
        "- **Current Temperature:** {}°F",
        format_number(t.current_temperature)
    );
    let _ = writeln!(
        out,
        "- **Target Temperature:** {}°F",
        format_number(t.target_temperature)
    );
    let _ = writeln!(out, "- **Mode:** {}", t.mode);
    let _ = writeln!(out, "- **Humidity:** {}%", format_number(t.humidity));
    let _ = writeln!(out, "- **Status:** {}", t.status);
    let _ = writeln!(out, "- **Last Updated:** {}", t.last_updated);
    out
}

/// Temperatures are shown in the unit the caller asked for
pub fn render_temperature_set(result: &TemperatureSetResult, unit: TemperatureUnit) -> String {
    let symbol = unit.symbol();
    let mut out = String::from("**Temperature Set Successfully**\n\n");
    let _ = writeln!(
        out,
        "- **Thermostat:** `{}`",
        shorten_device_id(&result.thermostat_id)
    );
    let _ = writeln!(
        out,
        "- **Previous:** {}°{symbol}",
        format_number(result.previous_temperature)
    );
    let _ = writeln!(
        out,
        "- **New Target:** {}°{symbol}",
        format_number(result.new_temperature)
    );
    let _ = writeln!(
        out,
        "- **Estimated Time:** {} minutes",
        result.estimated_time_minutes
    );
    out
}

pub fn render_history(history: &[HistoryEntry], hours: u32) -> String {
    if history.is_empty() {
        return "No history data available.".to_string();
    }

    let temps: Vec<f64> = history.iter().map(|e| e.temperature).collect();
    let average = temps.iter().sum::<f64>() / temps.len() as f64;
    let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut out = format!(
        "**Temperature History** ({} entries, last {hours} hours)\n\n",
        history.len()
    );
    out.push_str("**Summary:**\n");
    let _ = writeln!(out, "- Average: {average:.1}°F");
    let _ = writeln!(out, "- Min: {min:.1}°F");
    let _ = writeln!(out, "- Max: {max:.1}°F\n");

    out.push_str("**Recent Readings:**\n");
    let start = history.len().saturating_sub(RECENT_READINGS);
    for entry in &history[start..] {
        let _ = writeln!(
            out,
            "- {}: {}°F, {}% humidity",
            entry.timestamp,
            format_number(entry.temperature),
            format_number(entry.humidity)
        );
    }

    if history.len() > RECENT_READINGS {
        let _ = writeln!(
            out,
            "\n_(Showing last {RECENT_READINGS} of {} entries)_",
            history.len()
        );
    }
    out
}

pub fn render_mode_set(result: &ModeSetResult) -> String {
    let mut out = String::from("**Mode Set Successfully**\n\n");
    let _ = writeln!(
        out,
        "- **Thermostat:** `{}`",
        shorten_device_id(&result.thermostat_id)
    );
    let _ = writeln!(out, "- **Previous Mode:** {}", result.previous_mode);
    let _ = writeln!(out, "- **New Mode:** {}", result.new_mode);
    out
}
