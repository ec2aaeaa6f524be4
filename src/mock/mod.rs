//! Mock implementations for testing
//!
//! An in-memory [`ThermostatClient`] seeded with the same three thermostats
//! the mock REST API serves.

use crate::client::{
    utc_timestamp, HistoryEntry, ModeSetResult, OperationalStatus, TemperatureSetResult,
    TemperatureUnit, ThermostatClient, ThermostatMode, ThermostatStatus,
};
use crate::error::{HomeAutomationError, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Mock thermostat backend for testing
pub struct MockThermostatClient {
    thermostats: Mutex<Vec<ThermostatStatus>>,
    supports_mode: bool,
    set_temperature_calls: AtomicUsize,
    close_calls: AtomicUsize,
    closed: AtomicBool,
}

fn seed(
    id: &str,
    name: &str,
    current: f64,
    target: f64,
    mode: ThermostatMode,
    humidity: f64,
) -> ThermostatStatus {
    ThermostatStatus {
        id: id.to_string(),
        name: name.to_string(),
        current_temperature: current,
        target_temperature: target,
        mode,
        humidity,
        status: OperationalStatus::Active,
        last_updated: utc_timestamp(),
    }
}

/// Living Room, Bedroom and Office, as served by the mock REST API
pub fn default_thermostats() -> Vec<ThermostatStatus> {
    vec![
        seed("thermostat-1", "Living Room", 72.0, 70.0, ThermostatMode::Cooling, 45.0),
        seed("thermostat-2", "Bedroom", 68.0, 68.0, ThermostatMode::Heating, 50.0),
        seed("thermostat-3", "Office", 74.0, 72.0, ThermostatMode::Off, 42.0),
    ]
}

impl Default for MockThermostatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockThermostatClient {
    /// Create a mock with the default thermostats
    pub fn new() -> Self {
        Self::with_thermostats(default_thermostats())
    }

    pub fn with_thermostats(thermostats: Vec<ThermostatStatus>) -> Self {
        Self {
            thermostats: Mutex::new(thermostats),
            supports_mode: true,
            set_temperature_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Reject mode changes the way the mock REST backend does
    pub fn without_mode_support(mut self) -> Self {
        self.supports_mode = false;
        self
    }

    pub fn set_temperature_calls(&self) -> usize {
        self.set_temperature_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn find(&self, thermostat_id: &str) -> Result<ThermostatStatus> {
        self.thermostats
            .lock()
            .await
            .iter()
            .find(|t| t.id == thermostat_id)
            .cloned()
            .ok_or_else(|| {
                HomeAutomationError::not_found(format!("Thermostat {thermostat_id} not found"))
            })
    }
}

#[async_trait]
impl ThermostatClient for MockThermostatClient {
    async fn list_thermostats(&self) -> Result<Vec<ThermostatStatus>> {
        Ok(self.thermostats.lock().await.clone())
    }

    async fn get_thermostat(&self, thermostat_id: &str) -> Result<ThermostatStatus> {
        self.find(thermostat_id).await
    }

    async fn set_temperature(
        &self,
        thermostat_id: &str,
        temperature: f64,
        unit: TemperatureUnit,
    ) -> Result<TemperatureSetResult> {
        self.set_temperature_calls.fetch_add(1, Ordering::SeqCst);

        let mut thermostats = self.thermostats.lock().await;
        let thermostat = thermostats
            .iter_mut()
            .find(|t| t.id == thermostat_id)
            .ok_or_else(|| {
                HomeAutomationError::not_found(format!("Thermostat {thermostat_id} not found"))
            })?;

        let previous = thermostat.target_temperature;
        let estimate = ((temperature - thermostat.current_temperature).abs() * 5.0) as u32;
        thermostat.target_temperature = temperature;

        Ok(TemperatureSetResult {
            success: true,
            thermostat_id: thermostat_id.to_string(),
            previous_temperature: previous,
            new_temperature: temperature,
            unit,
            estimated_time_minutes: estimate,
            timestamp: utc_timestamp(),
        })
    }

    async fn get_history(&self, thermostat_id: &str, hours: u32) -> Result<Vec<HistoryEntry>> {
        let base = self.find(thermostat_id).await?.current_temperature;
        let now = Utc::now();

        Ok((0..hours)
            .map(|i| HistoryEntry {
                timestamp: (now - Duration::hours(i64::from(hours - i)))
                    .format("%Y-%m-%dT%H:%M:%S%.6fZ")
                    .to_string(),
                temperature: base + f64::from(i % 3) - 1.0,
                humidity: 45.0 + f64::from(i % 5),
            })
            .collect())
    }

    async fn set_mode(&self, thermostat_id: &str, mode: ThermostatMode) -> Result<ModeSetResult> {
        if !self.supports_mode {
            return Err(HomeAutomationError::invalid_input(format!(
                "Changing the mode of {thermostat_id} to {mode} is not supported by the dummy API"
            )));
        }

        let mut thermostats = self.thermostats.lock().await;
        let thermostat = thermostats
            .iter_mut()
            .find(|t| t.id == thermostat_id)
            .ok_or_else(|| {
                HomeAutomationError::not_found(format!("Thermostat {thermostat_id} not found"))
            })?;

        let previous = thermostat.mode;
        thermostat.mode = mode;
        Ok(ModeSetResult {
            success: true,
            thermostat_id: thermostat_id.to_string(),
            previous_mode: previous,
            new_mode: mode,
            timestamp: utc_timestamp(),
        })
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
