//! Client for the mock thermostat REST API

use crate::client::{
    HistoryEntry, HttpSession, ModeSetResult, TemperatureSetResult, TemperatureUnit,
    ThermostatClient, ThermostatMode, ThermostatStatus,
};
use crate::error::{HomeAutomationError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ThermostatList {
    #[serde(default)]
    thermostats: Vec<ThermostatStatus>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TemperatureRequest {
    temperature: f64,
    unit: TemperatureUnit,
}

/// HTTP client for the mock thermostat store
pub struct DummyNestClient {
    http: HttpSession,
    base_url: String,
}

impl DummyNestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(HomeAutomationError::config("Base URL required for dummy API"));
        }
        info!("Initializing dummy API client with URL: {base_url}");

        Ok(Self {
            http: HttpSession::new(timeout)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turn a response into `T`, mapping 404 to NotFound and other failures to Upstream
    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
        thermostat_id: Option<&str>,
    ) -> Result<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(HomeAutomationError::from_transport)?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| text.clone());

        match (status.as_u16(), thermostat_id) {
            (404, Some(id)) => {
                debug!("Dummy API reports {id} missing: {message}");
                Err(HomeAutomationError::not_found(format!(
                    "Thermostat {id} not found"
                )))
            }
            (code, _) => Err(HomeAutomationError::upstream(code, message)),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        thermostat_id: Option<&str>,
    ) -> Result<T> {
        let response = self
            .http
            .client()?
            .get(self.build_url(path))
            .query(query)
            .send()
            .await
            .map_err(HomeAutomationError::from_transport)?;
        Self::parse(response, thermostat_id).await
    }
}

#[async_trait]
impl ThermostatClient for DummyNestClient {
    async fn list_thermostats(&self) -> Result<Vec<ThermostatStatus>> {
        info!("Fetching thermostat list from dummy API");
        let list: ThermostatList = self.get("thermostats", &[], None).await?;
        Ok(list.thermostats)
    }

    async fn get_thermostat(&self, thermostat_id: &str) -> Result<ThermostatStatus> {
        info!("Fetching dummy thermostat: {thermostat_id}");
        self.get(
            &format!("thermostats/{thermostat_id}"),
            &[],
            Some(thermostat_id),
        )
        .await
    }

    async fn set_temperature(
        &self,
        thermostat_id: &str,
        temperature: f64,
        unit: TemperatureUnit,
    ) -> Result<TemperatureSetResult> {
        info!(
            "Setting dummy thermostat {thermostat_id} to {temperature}°{}",
            unit.symbol()
        );
        let response = self
            .http
            .client()?
            .post(self.build_url(&format!("thermostats/{thermostat_id}/temperature")))
            .json(&TemperatureRequest { temperature, unit })
            .send()
            .await
            .map_err(HomeAutomationError::from_transport)?;
        Self::parse(response, Some(thermostat_id)).await
    }

    async fn get_history(&self, thermostat_id: &str, hours: u32) -> Result<Vec<HistoryEntry>> {
        info!("Fetching history for dummy thermostat {thermostat_id} ({hours} hours)");
        let history: HistoryResponse = self
            .get(
                &format!("thermostats/{thermostat_id}/history"),
                &[("hours", hours.to_string())],
                Some(thermostat_id),
            )
            .await?;
        Ok(history.history)
    }

    async fn set_mode(&self, thermostat_id: &str, mode: ThermostatMode) -> Result<ModeSetResult> {
        Err(HomeAutomationError::invalid_input(format!(
            "Changing the mode of {thermostat_id} to {mode} is not supported by the dummy API"
        )))
    }

    async fn close(&self) {
        if self.http.release() {
            info!("Dummy API client closed");
        }
    }

    fn backend_name(&self) -> &'static str {
        "dummy"
    }
}
