//! Thermostat client backed by the Google SDM API

use crate::client::sdm_client::{DeviceCommand, GoogleSdmClient};
use crate::client::{
    utc_timestamp, HistoryEntry, ModeSetResult, TemperatureSetResult, TemperatureUnit,
    ThermostatClient, ThermostatMode, ThermostatStatus,
};
use crate::error::Result;
use crate::services::normalizer::{
    fahrenheit_to_celsius, parse_sdm_device, round_one_decimal,
};
use async_trait::async_trait;
use tracing::{info, warn};

/// SDM writes are not instantaneous; this is the estimate reported to callers
const SDM_ESTIMATED_MINUTES: u32 = 5;

pub struct SdmThermostatClient {
    sdm: GoogleSdmClient,
}

impl SdmThermostatClient {
    pub fn new(sdm: GoogleSdmClient) -> Self {
        Self { sdm }
    }
}

#[async_trait]
impl ThermostatClient for SdmThermostatClient {
    async fn list_thermostats(&self) -> Result<Vec<ThermostatStatus>> {
        info!("Fetching real thermostats from Google SDM API");
        let devices = self.sdm.list_devices().await?;
        let thermostats: Vec<ThermostatStatus> = devices
            .iter()
            .filter(|d| d.is_thermostat())
            .map(parse_sdm_device)
            .collect();
        info!("Retrieved {} real thermostats", thermostats.len());
        Ok(thermostats)
    }

    async fn get_thermostat(&self, thermostat_id: &str) -> Result<ThermostatStatus> {
        info!("Fetching real thermostat: {thermostat_id}");
        let device = self.sdm.get_device(thermostat_id).await?;
        Ok(parse_sdm_device(&device))
    }

    async fn set_temperature(
        &self,
        thermostat_id: &str,
        temperature: f64,
        unit: TemperatureUnit,
    ) -> Result<TemperatureSetResult> {
        info!(
            "Setting real thermostat {thermostat_id} to {temperature}°{}",
            unit.symbol()
        );

        let device = self.sdm.get_device(thermostat_id).await?;
        let current = parse_sdm_device(&device);

        let (celsius, previous) = match unit {
            TemperatureUnit::Fahrenheit => {
                (fahrenheit_to_celsius(temperature), current.target_temperature)
            }
            TemperatureUnit::Celsius => (
                temperature,
                round_one_decimal(fahrenheit_to_celsius(current.target_temperature)),
            ),
        };

        let command = DeviceCommand::setpoint_for_mode(device.raw_mode(), celsius);
        self.sdm.execute_command(thermostat_id, &command).await?;

        Ok(TemperatureSetResult {
            success: true,
            thermostat_id: thermostat_id.to_string(),
            previous_temperature: previous,
            new_temperature: temperature,
            unit,
            estimated_time_minutes: SDM_ESTIMATED_MINUTES,
            timestamp: utc_timestamp(),
        })
    }

    async fn get_history(&self, thermostat_id: &str, _hours: u32) -> Result<Vec<HistoryEntry>> {
        warn!("Temperature history not available in Google SDM API");
        let status = self.get_thermostat(thermostat_id).await?;
        Ok(vec![HistoryEntry {
            timestamp: status.last_updated,
            temperature: status.current_temperature,
            humidity: status.humidity,
        }])
    }

    async fn set_mode(&self, thermostat_id: &str, mode: ThermostatMode) -> Result<ModeSetResult> {
        info!("Setting real thermostat {thermostat_id} mode to {mode}");
        let current = self.get_thermostat(thermostat_id).await?;

        self.sdm
            .execute_command(thermostat_id, &DeviceCommand::set_mode(mode.sdm_mode()))
            .await?;

        Ok(ModeSetResult {
            success: true,
            thermostat_id: thermostat_id.to_string(),
            previous_mode: current.mode,
            new_mode: mode,
            timestamp: utc_timestamp(),
        })
    }

    async fn close(&self) {
        if self.sdm.close() {
            info!("Google SDM client closed");
        }
    }

    fn backend_name(&self) -> &'static str {
        "google-sdm"
    }
}
