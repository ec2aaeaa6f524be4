//! Google Smart Device Management API client
//!
//! Talks to the SDM REST API with a bearer token. A 401 triggers exactly one
//! OAuth refresh followed by exactly one retry of the original request.

use crate::client::HttpSession;
use crate::config::env_file::TokenStore;
use crate::config::GoogleSdmConfig;
use crate::error::{HomeAutomationError, Result};
use crate::services::normalizer::SdmDevice;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const SET_HEAT_COMMAND: &str = "sdm.devices.commands.ThermostatTemperatureSetpoint.SetHeat";
pub const SET_COOL_COMMAND: &str = "sdm.devices.commands.ThermostatTemperatureSetpoint.SetCool";
pub const SET_RANGE_COMMAND: &str = "sdm.devices.commands.ThermostatTemperatureSetpoint.SetRange";
pub const SET_MODE_COMMAND: &str = "sdm.devices.commands.ThermostatMode.SetMode";

/// Where a single request is in the refresh-and-retry sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// First attempt with the current access token
    Authenticated,
    /// First attempt was rejected, a new token is being fetched
    Refreshing,
    /// Second and last attempt with the refreshed token
    Retried,
    /// Rejected again, no further attempts
    Failed,
}

impl AuthState {
    /// Transition taken when the backend answers 401
    pub fn on_unauthorized(self) -> Self {
        match self {
            AuthState::Authenticated => AuthState::Refreshing,
            AuthState::Refreshing | AuthState::Retried | AuthState::Failed => AuthState::Failed,
        }
    }
}

/// An SDM `executeCommand` payload
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommand {
    pub command: &'static str,
    pub params: Value,
}

impl DeviceCommand {
    /// Setpoint command matching the device's current raw mode.
    ///
    /// A device without a mode trait is treated as HEAT.
    pub fn setpoint_for_mode(raw_mode: Option<&str>, celsius: f64) -> Self {
        match raw_mode.unwrap_or("HEAT") {
            "COOL" => Self {
                command: SET_COOL_COMMAND,
                params: json!({ "coolCelsius": celsius }),
            },
            "HEATCOOL" => Self {
                command: SET_RANGE_COMMAND,
                params: json!({
                    "heatCelsius": celsius - 1.0,
                    "coolCelsius": celsius + 1.0,
                }),
            },
            _ => Self {
                command: SET_HEAT_COMMAND,
                params: json!({ "heatCelsius": celsius }),
            },
        }
    }

    pub fn set_mode(sdm_mode: &str) -> Self {
        Self {
            command: SET_MODE_COMMAND,
            params: json!({ "mode": sdm_mode }),
        }
    }

    pub fn to_body(&self) -> Value {
        json!({ "command": self.command, "params": self.params })
    }
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<SdmDevice>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Low-level SDM API client
pub struct GoogleSdmClient {
    http: HttpSession,
    project_id: String,
    api_base: String,
    token_url: url::Url,
    refresh_token: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    access_token: RwLock<String>,
    token_store: Arc<dyn TokenStore>,
}

impl GoogleSdmClient {
    pub fn new(
        config: GoogleSdmConfig,
        timeout: Duration,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        if config.project_id.trim().is_empty() || config.access_token.trim().is_empty() {
            return Err(HomeAutomationError::config(
                "Google project ID and access token are required for the SDM API",
            ));
        }

        info!("Initializing Google SDM API client for project {}", config.project_id);

        Ok(Self {
            http: HttpSession::new(timeout)?,
            project_id: config.project_id,
            api_base: config.api_base.as_str().trim_end_matches('/').to_string(),
            token_url: config.token_url,
            refresh_token: config.refresh_token,
            client_id: config.client_id,
            client_secret: config.client_secret,
            access_token: RwLock::new(config.access_token),
            token_store,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Access token currently in use
    pub async fn access_token(&self) -> String {
        self.access_token.read().await.clone()
    }

    fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base, endpoint.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let token = self.access_token.read().await.clone();
        let mut request = self
            .http
            .client()?
            .request(method.clone(), url)
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(HomeAutomationError::from_transport)
    }

    /// Perform an authenticated request, refreshing the token once on 401
    async fn request(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.build_url(endpoint);
        let mut state = AuthState::Authenticated;

        loop {
            debug!("SDM {method} {url} ({state:?})");
            let response = self.send(&method, &url, body).await?;
            let status = response.status();

            if status != StatusCode::UNAUTHORIZED {
                return Self::into_json(response).await;
            }

            state = state.on_unauthorized();
            match state {
                AuthState::Refreshing => {
                    info!("Access token expired. Refreshing...");
                    self.refresh_access_token().await?;
                    state = AuthState::Retried;
                }
                _ => {
                    let text = response.text().await.unwrap_or_default();
                    error!("SDM request rejected after token refresh: {status} - {text}");
                    return Err(HomeAutomationError::authentication(format!(
                        "SDM API rejected refreshed access token (HTTP {}): {text}",
                        status.as_u16()
                    )));
                }
            }
        }
    }

    async fn into_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await.map_err(HomeAutomationError::from_transport)?;

        if !status.is_success() {
            error!("API request failed: {} - {}", status.as_u16(), text);
            return Err(HomeAutomationError::upstream(status.as_u16(), text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Exchange the refresh token for a new access token and persist it
    pub async fn refresh_access_token(&self) -> Result<String> {
        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            self.refresh_token.as_deref(),
            self.client_id.as_deref(),
            self.client_secret.as_deref(),
        ) else {
            return Err(HomeAutomationError::config(
                "Missing credentials for token refresh (GOOGLE_REFRESH_TOKEN, GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET)",
            ));
        };

        let form = [
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .client()?
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await
            .map_err(HomeAutomationError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(HomeAutomationError::from_transport)?;
        if !status.is_success() {
            error!("Token refresh failed: {} - {}", status.as_u16(), text);
            return Err(HomeAutomationError::upstream(
                status.as_u16(),
                format!("Token refresh failed: {text}"),
            ));
        }

        let token = serde_json::from_str::<TokenResponse>(&text)?
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                HomeAutomationError::upstream(status.as_u16(), "No access token in refresh response")
            })?;

        *self.access_token.write().await = token.clone();

        match self.token_store.store_access_token(&token).await {
            Ok(()) => info!("Access token refreshed and persisted"),
            Err(e) => warn!("Access token refreshed but could not be persisted: {e}"),
        }

        Ok(token)
    }

    /// List all devices in the project
    pub async fn list_devices(&self) -> Result<Vec<SdmDevice>> {
        let endpoint = format!("enterprises/{}/devices", self.project_id);
        let data = self.request(Method::GET, &endpoint, None).await?;
        Ok(serde_json::from_value::<DeviceList>(data)?.devices)
    }

    /// Get a device by its full path
    pub async fn get_device(&self, device_path: &str) -> Result<SdmDevice> {
        let data = self
            .request(Method::GET, device_path.trim_start_matches('/'), None)
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Run a command against a device
    pub async fn execute_command(&self, device_path: &str, command: &DeviceCommand) -> Result<Value> {
        info!("Executing {} on {}", command.command, device_path);
        let endpoint = format!("{}:executeCommand", device_path.trim_start_matches('/'));
        self.request(Method::POST, &endpoint, Some(&command.to_body()))
            .await
    }

    /// Release the HTTP client
    pub fn close(&self) -> bool {
        self.http.release()
    }
}
