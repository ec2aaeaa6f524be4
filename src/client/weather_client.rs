//! OpenWeatherMap client

use crate::client::HttpSession;
use crate::config::WeatherConfig;
use crate::error::{HomeAutomationError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Unit system understood by OpenWeatherMap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeatherUnits {
    #[default]
    Imperial,
    Metric,
    Standard,
}

impl WeatherUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherUnits::Imperial => "imperial",
            WeatherUnits::Metric => "metric",
            WeatherUnits::Standard => "standard",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            WeatherUnits::Imperial => "°F",
            WeatherUnits::Metric => "°C",
            WeatherUnits::Standard => "K",
        }
    }

    pub fn speed_unit(&self) -> &'static str {
        match self {
            WeatherUnits::Imperial => "mph",
            WeatherUnits::Metric | WeatherUnits::Standard => "m/s",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentWeather {
    pub location: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub pressure: i64,
    pub description: String,
    pub wind_speed: f64,
    pub clouds: i64,
    /// Unix seconds
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastEntry {
    pub timestamp: i64,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i64,
    pub description: String,
    /// Probability of precipitation, 0.0 - 1.0
    pub pop: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherAlert {
    pub event: String,
    pub start: i64,
    pub end: i64,
    pub description: String,
    pub sender_name: String,
}

// Wire formats

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    feels_like: f64,
    humidity: i64,
    #[serde(default)]
    pressure: i64,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmClouds {
    all: i64,
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    name: String,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    wind: OwmWind,
    clouds: OwmClouds,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    weather: Vec<OwmCondition>,
    #[serde(default)]
    pop: f64,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmForecast {
    list: Vec<OwmForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OwmOneCall {
    #[serde(default)]
    alerts: Vec<WeatherAlert>,
}

fn first_description(conditions: &[OwmCondition]) -> Result<String> {
    conditions
        .first()
        .map(|c| c.description.clone())
        .ok_or_else(|| HomeAutomationError::parsing_error("Weather response has no conditions"))
}

/// OpenWeatherMap forecasts come in 3-hour steps, at most 40 of them
pub fn forecast_count(days: u32) -> u32 {
    days.saturating_mul(8).min(40)
}

pub struct WeatherClient {
    http: HttpSession,
    config: WeatherConfig,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig, timeout: Duration) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(HomeAutomationError::config("WEATHER_API_KEY is required"));
        }
        Ok(Self {
            http: HttpSession::new(timeout)?,
            config,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base.as_str().trim_end_matches('/'),
            path
        )
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http
            .client()?
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(HomeAutomationError::from_transport)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(HomeAutomationError::from_transport)?;
        if !status.is_success() {
            return Err(HomeAutomationError::upstream(status.as_u16(), text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn get_current_weather(
        &self,
        location: &str,
        units: WeatherUnits,
    ) -> Result<CurrentWeather> {
        info!("Fetching current weather for: {location}");
        let data: OwmCurrent = self
            .get_json(
                &self.endpoint("weather"),
                &[
                    ("q", location.to_string()),
                    ("appid", self.config.api_key.clone()),
                    ("units", units.as_str().to_string()),
                ],
            )
            .await?;

        Ok(CurrentWeather {
            description: first_description(&data.weather)?,
            location: data.name,
            temperature: data.main.temp,
            feels_like: data.main.feels_like,
            humidity: data.main.humidity,
            pressure: data.main.pressure,
            wind_speed: data.wind.speed,
            clouds: data.clouds.all,
            timestamp: data.dt,
        })
    }

    pub async fn get_forecast(
        &self,
        location: &str,
        units: WeatherUnits,
        days: u32,
    ) -> Result<Vec<ForecastEntry>> {
        info!("Fetching {days}-day forecast for: {location}");
        let data: OwmForecast = self
            .get_json(
                &self.endpoint("forecast"),
                &[
                    ("q", location.to_string()),
                    ("appid", self.config.api_key.clone()),
                    ("units", units.as_str().to_string()),
                    ("cnt", forecast_count(days).to_string()),
                ],
            )
            .await?;

        data.list
            .into_iter()
            .map(|item| {
                Ok(ForecastEntry {
                    description: first_description(&item.weather)?,
                    timestamp: item.dt,
                    temperature: item.main.temp,
                    feels_like: item.main.feels_like,
                    humidity: item.main.humidity,
                    pop: item.pop,
                    wind_speed: item.wind.speed,
                })
            })
            .collect()
    }

    /// Active alerts for a coordinate, `None` when there are none
    pub async fn get_alerts(&self, lat: f64, lon: f64) -> Result<Option<Vec<WeatherAlert>>> {
        info!("Fetching weather alerts for: {lat}, {lon}");
        let data: OwmOneCall = self
            .get_json(
                self.config.onecall_url.as_str(),
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("appid", self.config.api_key.clone()),
                    ("exclude", "current,minutely,hourly,daily".to_string()),
                ],
            )
            .await?;

        if data.alerts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(data.alerts))
        }
    }

    /// Release the HTTP client
    pub fn close(&self) -> bool {
        let released = self.http.release();
        if released {
            info!("Weather client closed");
        }
        released
    }
}
