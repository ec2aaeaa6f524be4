//! Unit and trait normalization
//!
//! Pure conversions between Fahrenheit and Celsius plus the mapping from an
//! SDM device (a bag of named traits) onto [`ThermostatStatus`].

use crate::client::{utc_timestamp, OperationalStatus, ThermostatMode, ThermostatStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const INFO_TRAIT: &str = "sdm.devices.traits.Info";
pub const TEMPERATURE_TRAIT: &str = "sdm.devices.traits.Temperature";
pub const HUMIDITY_TRAIT: &str = "sdm.devices.traits.Humidity";
pub const MODE_TRAIT: &str = "sdm.devices.traits.ThermostatMode";
pub const SETPOINT_TRAIT: &str = "sdm.devices.traits.ThermostatTemperatureSetpoint";
pub const HVAC_TRAIT: &str = "sdm.devices.traits.ThermostatHvac";

const DEFAULT_AMBIENT_CELSIUS: f64 = 20.0;
const DEFAULT_HUMIDITY_PERCENT: f64 = 50.0;
const DEFAULT_AUTO_HEAT_CELSIUS: f64 = 20.0;
const DEFAULT_AUTO_COOL_CELSIUS: f64 = 25.0;

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

/// Round to one decimal place, half away from zero
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A device as returned by the SDM API
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SdmDevice {
    /// Full resource path, `enterprises/{project}/devices/{id}`
    #[serde(default)]
    pub name: Option<String>,

    #[serde(rename = "type", default)]
    pub device_type: Option<String>,

    #[serde(default)]
    pub traits: Map<String, Value>,
}

impl SdmDevice {
    fn trait_field(&self, trait_name: &str, field: &str) -> Option<&Value> {
        self.traits.get(trait_name).and_then(|t| t.get(field))
    }

    pub fn trait_f64(&self, trait_name: &str, field: &str) -> Option<f64> {
        self.trait_field(trait_name, field).and_then(Value::as_f64)
    }

    pub fn trait_str(&self, trait_name: &str, field: &str) -> Option<&str> {
        self.trait_field(trait_name, field).and_then(Value::as_str)
    }

    /// Raw SDM mode string (HEAT, COOL, HEATCOOL, OFF, ...)
    pub fn raw_mode(&self) -> Option<&str> {
        self.trait_str(MODE_TRAIT, "mode")
    }

    pub fn is_thermostat(&self) -> bool {
        self.device_type
            .as_deref()
            .map(|t| t.to_uppercase().contains("THERMOSTAT"))
            .unwrap_or(false)
    }

    /// Last path segment of the device name
    pub fn short_id(&self) -> String {
        match self.name.as_deref() {
            Some(name) => match name.rsplit('/').next() {
                Some(tail) if !tail.is_empty() => tail.to_string(),
                _ if !name.is_empty() => name.to_string(),
                _ => "unknown".to_string(),
            },
            None => "unknown".to_string(),
        }
    }
}

/// Map a raw SDM mode onto the normalized mode; unknown values are off
pub fn mode_from_sdm(raw: Option<&str>) -> ThermostatMode {
    match raw.unwrap_or("OFF") {
        "HEAT" => ThermostatMode::Heating,
        "COOL" => ThermostatMode::Cooling,
        "HEATCOOL" => ThermostatMode::Auto,
        _ => ThermostatMode::Off,
    }
}

/// Target temperature in Celsius derived from the setpoint trait
fn target_celsius(device: &SdmDevice, mode: ThermostatMode, ambient_c: f64) -> f64 {
    let heat = device.trait_f64(SETPOINT_TRAIT, "heatCelsius");
    let cool = device.trait_f64(SETPOINT_TRAIT, "coolCelsius");

    match (mode, heat, cool) {
        (ThermostatMode::Cooling, _, Some(cool)) => cool,
        (ThermostatMode::Heating, Some(heat), _) => heat,
        (ThermostatMode::Auto, heat, cool) => {
            (heat.unwrap_or(DEFAULT_AUTO_HEAT_CELSIUS) + cool.unwrap_or(DEFAULT_AUTO_COOL_CELSIUS))
                / 2.0
        }
        _ => ambient_c,
    }
}

/// Normalize an SDM device into a [`ThermostatStatus`]
pub fn parse_sdm_device(device: &SdmDevice) -> ThermostatStatus {
    let short_id = device.short_id();
    let name = device
        .trait_str(INFO_TRAIT, "customName")
        .map(str::to_string)
        .unwrap_or_else(|| short_id.clone());

    let ambient_c = device
        .trait_f64(TEMPERATURE_TRAIT, "ambientTemperatureCelsius")
        .unwrap_or(DEFAULT_AMBIENT_CELSIUS);
    let humidity = device
        .trait_f64(HUMIDITY_TRAIT, "ambientHumidityPercent")
        .unwrap_or(DEFAULT_HUMIDITY_PERCENT);

    let mode = mode_from_sdm(device.raw_mode());
    let target_c = target_celsius(device, mode, ambient_c);

    let status = match device.trait_str(HVAC_TRAIT, "status").unwrap_or("OFF") {
        "OFF" => OperationalStatus::Idle,
        _ => OperationalStatus::Active,
    };

    ThermostatStatus {
        id: device.name.clone().unwrap_or(short_id),
        name,
        current_temperature: round_one_decimal(celsius_to_fahrenheit(ambient_c)),
        target_temperature: round_one_decimal(celsius_to_fahrenheit(target_c)),
        mode,
        humidity: round_one_decimal(humidity),
        status,
        last_updated: utc_timestamp(),
    }
}
