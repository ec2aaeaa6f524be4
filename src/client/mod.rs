//! Thermostat backend clients
//!
//! Two interchangeable implementations of [`ThermostatClient`]: one talks to the
//! mock thermostat REST API, the other to the Google Smart Device Management
//! API. The weather client lives here too since it shares the HTTP plumbing.

pub mod dummy_client;
pub mod nest_client;
pub mod sdm_client;
pub mod weather_client;

use crate::config::env_file::{EnvFileTokenStore, TokenStore};
use crate::config::{BackendConfig, ServerConfig};
use crate::error::{HomeAutomationError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub use dummy_client::DummyNestClient;
pub use nest_client::SdmThermostatClient;
pub use sdm_client::GoogleSdmClient;
pub use weather_client::WeatherClient;

/// Normalized thermostat operating mode
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatMode {
    Heating,
    Cooling,
    Auto,
    Off,
}

impl ThermostatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThermostatMode::Heating => "heating",
            ThermostatMode::Cooling => "cooling",
            ThermostatMode::Auto => "auto",
            ThermostatMode::Off => "off",
        }
    }

    /// SDM `ThermostatMode` value for this mode
    pub fn sdm_mode(&self) -> &'static str {
        match self {
            ThermostatMode::Heating => "HEAT",
            ThermostatMode::Cooling => "COOL",
            ThermostatMode::Auto => "HEATCOOL",
            ThermostatMode::Off => "OFF",
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the HVAC equipment is currently running
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationalStatus {
    Active,
    Idle,
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationalStatus::Active => "active",
            OperationalStatus::Idle => "idle",
        })
    }
}

/// Temperature unit a caller works in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Fahrenheit,
    Celsius,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Celsius => "celsius",
        }
    }

    /// Single-letter symbol, "F" or "C"
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Fahrenheit => "F",
            TemperatureUnit::Celsius => "C",
        }
    }
}

/// Thermostat status, temperatures always in Fahrenheit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermostatStatus {
    /// Backend-scoped identifier (mock id or full SDM device path)
    pub id: String,
    pub name: String,
    pub current_temperature: f64,
    pub target_temperature: f64,
    pub mode: ThermostatMode,
    pub humidity: f64,
    pub status: OperationalStatus,
    /// ISO-8601 UTC timestamp
    pub last_updated: String,
}

/// Outcome of a setpoint change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemperatureSetResult {
    pub success: bool,
    pub thermostat_id: String,
    pub previous_temperature: f64,
    pub new_temperature: f64,
    pub unit: TemperatureUnit,
    pub estimated_time_minutes: u32,
    pub timestamp: String,
}

/// Single reading in a thermostat's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub temperature: f64,
    pub humidity: f64,
}

/// Outcome of a mode change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModeSetResult {
    pub success: bool,
    pub thermostat_id: String,
    pub previous_mode: ThermostatMode,
    pub new_mode: ThermostatMode,
    pub timestamp: String,
}

/// Current UTC time in the `...Z` form used by every backend
pub fn utc_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

/// Operations every thermostat backend supports
#[async_trait]
pub trait ThermostatClient: Send + Sync {
    /// List all thermostats
    async fn list_thermostats(&self) -> Result<Vec<ThermostatStatus>>;

    /// Get the status of one thermostat
    async fn get_thermostat(&self, thermostat_id: &str) -> Result<ThermostatStatus>;

    /// Change the target temperature
    async fn set_temperature(
        &self,
        thermostat_id: &str,
        temperature: f64,
        unit: TemperatureUnit,
    ) -> Result<TemperatureSetResult>;

    /// Readings for the last `hours` hours, oldest first
    async fn get_history(&self, thermostat_id: &str, hours: u32) -> Result<Vec<HistoryEntry>>;

    /// Change the operating mode
    async fn set_mode(&self, thermostat_id: &str, mode: ThermostatMode) -> Result<ModeSetResult>;

    /// Release the outbound HTTP client. Safe to call more than once.
    async fn close(&self);

    /// Short backend label for logs
    fn backend_name(&self) -> &'static str;
}

/// Shared reqwest client that can be released exactly once
#[derive(Debug)]
pub struct HttpSession {
    client: RwLock<Option<Client>>,
}

impl HttpSession {
    /// Build an HTTP client with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(format!("home-automation-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                HomeAutomationError::connection(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client: RwLock::new(Some(client)),
        })
    }

    /// Handle to the live client, or an error once released
    pub fn client(&self) -> Result<Client> {
        let guard = self
            .client
            .read()
            .map_err(|_| HomeAutomationError::internal("HTTP session lock poisoned"))?;
        guard
            .as_ref()
            .cloned()
            .ok_or_else(|| HomeAutomationError::connection("HTTP client already closed"))
    }

    /// Drop the client. Returns true only for the call that actually released it.
    pub fn release(&self) -> bool {
        match self.client.write() {
            Ok(mut guard) => guard.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.client.read().map(|g| g.is_some()).unwrap_or(false)
    }
}

/// Build the thermostat client selected by the configuration
pub fn create_thermostat_client(config: &ServerConfig) -> Result<Arc<dyn ThermostatClient>> {
    match &config.backend {
        BackendConfig::Dummy(dummy) => Ok(Arc::new(DummyNestClient::new(
            dummy.base_url.as_str(),
            config.http.timeout,
        )?)),
        BackendConfig::Google(google) => {
            let store: Arc<dyn TokenStore> = Arc::new(EnvFileTokenStore::new(&config.env_file));
            let sdm = GoogleSdmClient::new(google.clone(), config.http.timeout, store)?;
            Ok(Arc::new(SdmThermostatClient::new(sdm)))
        }
    }
}

/// Build the weather client if an API key is configured
pub fn create_weather_client(config: &ServerConfig) -> Result<Option<Arc<WeatherClient>>> {
    config
        .weather
        .as_ref()
        .map(|weather| WeatherClient::new(weather.clone(), config.http.timeout).map(Arc::new))
        .transpose()
}
