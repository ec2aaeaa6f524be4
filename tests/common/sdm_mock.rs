//! WireMock-based Google SDM API mocking
//!
//! Device payloads use the real SDM trait layout; the server helpers mount
//! the endpoints most tests need, each guarded by the expected bearer token.

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const PROJECT_ID: &str = "test-project";

pub fn device_path(device_id: &str) -> String {
    format!("enterprises/{PROJECT_ID}/devices/{device_id}")
}

/// A thermostat device as SDM reports it
pub fn thermostat_device(
    device_id: &str,
    custom_name: &str,
    mode: &str,
    ambient_celsius: f64,
    heat_celsius: Option<f64>,
    cool_celsius: Option<f64>,
    hvac_status: &str,
) -> Value {
    let mut setpoint = serde_json::Map::new();
    if let Some(heat) = heat_celsius {
        setpoint.insert("heatCelsius".to_string(), json!(heat));
    }
    if let Some(cool) = cool_celsius {
        setpoint.insert("coolCelsius".to_string(), json!(cool));
    }

    json!({
        "name": device_path(device_id),
        "type": "sdm.devices.types.THERMOSTAT",
        "traits": {
            "sdm.devices.traits.Info": {"customName": custom_name},
            "sdm.devices.traits.Humidity": {"ambientHumidityPercent": 41.0},
            "sdm.devices.traits.Temperature": {"ambientTemperatureCelsius": ambient_celsius},
            "sdm.devices.traits.ThermostatMode": {
                "mode": mode,
                "availableModes": ["HEAT", "COOL", "HEATCOOL", "OFF"]
            },
            "sdm.devices.traits.ThermostatHvac": {"status": hvac_status},
            "sdm.devices.traits.ThermostatTemperatureSetpoint": Value::Object(setpoint),
        }
    })
}

/// A non-thermostat device that listings must skip
pub fn camera_device(device_id: &str) -> Value {
    json!({
        "name": device_path(device_id),
        "type": "sdm.devices.types.CAMERA",
        "traits": {"sdm.devices.traits.Info": {"customName": "Front Door"}}
    })
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub struct MockSdmServer {
    pub server: MockServer,
}

impl MockSdmServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Device listing for requests carrying `token`
    pub async fn mount_devices(&self, token: &str, devices: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/enterprises/{PROJECT_ID}/devices")))
            .and(header("authorization", bearer(token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"devices": devices})))
            .mount(&self.server)
            .await;
    }

    /// Single device fetch for requests carrying `token`
    pub async fn mount_device(&self, token: &str, device: Value) {
        let name = device["name"].as_str().unwrap_or_default().to_string();
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .and(header("authorization", bearer(token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(device))
            .mount(&self.server)
            .await;
    }

    /// Token endpoint handing out `new_token`, expected to be hit `times` times
    pub async fn mount_token_refresh(&self, new_token: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": new_token,
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(times)
            .mount(&self.server)
            .await;
    }

    /// Every request with `token` gets a 401
    pub async fn reject_token(&self, token: &str) {
        Mock::given(header("authorization", bearer(token).as_str()))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"code": 401, "status": "UNAUTHENTICATED"}
            })))
            .mount(&self.server)
            .await;
    }
}
