//! Common test utilities

#![allow(dead_code)]

pub mod dummy_api_mock;
pub mod sdm_mock;
pub mod weather_mock;

pub use dummy_api_mock::MockDummyApi;
pub use sdm_mock::{thermostat_device, MockSdmServer, PROJECT_ID};
pub use weather_mock::MockWeatherServer;

use home_automation_mcp::config::{GoogleSdmConfig, WeatherConfig};
use std::time::Duration;
use url::Url;

pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// SDM configuration pointing at a mock server, with refresh credentials
pub fn sdm_config(base_uri: &str) -> GoogleSdmConfig {
    GoogleSdmConfig {
        project_id: PROJECT_ID.to_string(),
        access_token: "old-token".to_string(),
        refresh_token: Some("refresh-token".to_string()),
        client_id: Some("client-id".to_string()),
        client_secret: Some("client-secret".to_string()),
        api_base: Url::parse(base_uri).unwrap(),
        token_url: Url::parse(&format!("{base_uri}/token")).unwrap(),
    }
}

/// Weather configuration pointing at a mock server
pub fn weather_config(base_uri: &str) -> WeatherConfig {
    WeatherConfig {
        api_key: "test-key".to_string(),
        api_base: Url::parse(&format!("{base_uri}/data/2.5")).unwrap(),
        onecall_url: Url::parse(&format!("{base_uri}/data/3.0/onecall")).unwrap(),
    }
}
