//! Weather tools backed by OpenWeatherMap
//!
//! Only registered when `WEATHER_API_KEY` is configured. Timestamps are
//! rendered in the server's local time zone.

use crate::client::weather_client::{CurrentWeather, ForecastEntry, WeatherAlert, WeatherUnits};
use crate::client::WeatherClient;
use crate::error::{HomeAutomationError, Result};
use crate::tools::{format_number, parse_arguments, ToolDefinition};
use chrono::{Local, TimeZone};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::{Display, Write};

pub const DEFAULT_FORECAST_DAYS: u32 = 3;
pub const MAX_FORECAST_DAYS: u32 = 5;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CurrentWeatherArgs {
    /// City name (e.g., 'London', 'New York')
    pub location: String,

    /// Units system (imperial=°F, metric=°C)
    #[serde(default)]
    pub units: WeatherUnits,
}

fn default_days() -> u32 {
    DEFAULT_FORECAST_DAYS
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ForecastArgs {
    /// City name
    pub location: String,

    /// Number of days (1-5)
    #[serde(default = "default_days")]
    #[schemars(range(min = 1, max = 5))]
    pub days: u32,

    /// Units system
    #[serde(default)]
    pub units: WeatherUnits,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AlertArgs {
    /// Latitude
    pub latitude: f64,

    /// Longitude
    pub longitude: f64,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new::<CurrentWeatherArgs>(
            "get_current_weather",
            "Get current weather conditions for a location",
        ),
        ToolDefinition::new::<ForecastArgs>(
            "get_weather_forecast",
            "Get weather forecast for a location",
        ),
        ToolDefinition::new::<AlertArgs>(
            "get_weather_alerts",
            "Get weather alerts for coordinates",
        ),
    ]
}

pub async fn handle(client: &WeatherClient, name: &str, arguments: Value) -> Result<String> {
    match name {
        "get_current_weather" => {
            let args: CurrentWeatherArgs = parse_arguments(arguments)?;
            validate_location(&args.location)?;
            let weather = client
                .get_current_weather(args.location.trim(), args.units)
                .await?;
            Ok(render_current(&weather, args.units, &Local))
        }
        "get_weather_forecast" => {
            let args: ForecastArgs = parse_arguments(arguments)?;
            validate_location(&args.location)?;
            validate_days(args.days)?;
            let forecast = client
                .get_forecast(args.location.trim(), args.units, args.days)
                .await?;
            Ok(render_forecast(
                &args.location,
                args.days,
                &forecast,
                args.units,
                &Local,
            ))
        }
        "get_weather_alerts" => {
            let args: AlertArgs = parse_arguments(arguments)?;
            validate_coordinates(args.latitude, args.longitude)?;
            let alerts = client.get_alerts(args.latitude, args.longitude).await?;
            Ok(render_alerts(
                args.latitude,
                args.longitude,
                alerts.as_deref().unwrap_or_default(),
                &Local,
            ))
        }
        other => Err(HomeAutomationError::invalid_input(format!(
            "Unknown weather tool: {other}"
        ))),
    }
}

fn validate_location(location: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(HomeAutomationError::invalid_input("Location must not be empty"));
    }
    Ok(())
}

pub fn validate_days(days: u32) -> Result<()> {
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(HomeAutomationError::invalid_input(format!(
            "Days must be between 1 and {MAX_FORECAST_DAYS} (got {days})"
        )));
    }
    Ok(())
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(HomeAutomationError::invalid_input(format!(
            "Latitude must be between -90 and 90 (got {latitude})"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(HomeAutomationError::invalid_input(format!(
            "Longitude must be between -180 and 180 (got {longitude})"
        )));
    }
    Ok(())
}

/// Capitalize the first letter of every word, lowercase the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

fn format_timestamp<Tz>(tz: &Tz, timestamp: i64, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match tz.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format(pattern).to_string(),
        None => timestamp.to_string(),
    }
}

pub fn render_current<Tz>(weather: &CurrentWeather, units: WeatherUnits, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let symbol = units.temperature_symbol();
    let mut out = format!("**Current Weather in {}**\n\n", weather.location);
    let _ = writeln!(
        out,
        "- **Temperature:** {}{symbol}",
        format_number(weather.temperature)
    );
    let _ = writeln!(
        out,
        "- **Feels Like:** {}{symbol}",
        format_number(weather.feels_like)
    );
    let _ = writeln!(out, "- **Description:** {}", title_case(&weather.description));
    let _ = writeln!(out, "- **Humidity:** {}%", weather.humidity);
    let _ = writeln!(out, "- **Pressure:** {} hPa", weather.pressure);
    let _ = writeln!(
        out,
        "- **Wind Speed:** {} {}",
        format_number(weather.wind_speed),
        units.speed_unit()
    );
    let _ = writeln!(out, "- **Cloud Cover:** {}%", weather.clouds);
    let _ = writeln!(
        out,
        "- **Updated:** {}",
        format_timestamp(tz, weather.timestamp, "%Y-%m-%d %H:%M:%S")
    );
    out
}

/// Forecast entries grouped under a heading per calendar day
pub fn render_forecast<Tz>(
    location: &str,
    days: u32,
    forecast: &[ForecastEntry],
    units: WeatherUnits,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let symbol = units.temperature_symbol();
    let mut out = format!("**Weather Forecast for {location}** ({days} days)\n\n");

    let mut current_day: Option<String> = None;
    for entry in forecast {
        let day = format_timestamp(tz, entry.timestamp, "%A, %B %d");
        if current_day.as_deref() != Some(day.as_str()) {
            let _ = writeln!(out, "\n**{day}:**");
            current_day = Some(day);
        }

        let _ = write!(
            out,
            "- {}: {}{symbol}, {}, Humidity: {}%, Wind: {} {}",
            format_timestamp(tz, entry.timestamp, "%I:%M %p"),
            format_number(entry.temperature),
            entry.description,
            entry.humidity,
            format_number(entry.wind_speed),
            units.speed_unit()
        );
        if entry.pop > 0.0 {
            let _ = write!(out, ", Precipitation: {}%", (entry.pop * 100.0) as i64);
        }
        out.push('\n');
    }
    out
}

pub fn render_alerts<Tz>(latitude: f64, longitude: f64, alerts: &[WeatherAlert], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if alerts.is_empty() {
        return format!("No weather alerts for coordinates {latitude}, {longitude}");
    }

    let mut out = format!("**Weather Alerts** ({} active)\n\n", alerts.len());
    for (i, alert) in alerts.iter().enumerate() {
        let _ = writeln!(out, "**Alert {}: {}**", i + 1, alert.event);
        let _ = writeln!(
            out,
            "- **From:** {}",
            format_timestamp(tz, alert.start, "%Y-%m-%d %H:%M")
        );
        let _ = writeln!(
            out,
            "- **To:** {}",
            format_timestamp(tz, alert.end, "%Y-%m-%d %H:%M")
        );
        let _ = writeln!(out, "- **Source:** {}", alert.sender_name);
        let _ = writeln!(out, "- **Description:** {}\n", alert.description);
    }
    out
}
