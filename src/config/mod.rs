//! Configuration management for the home automation MCP server
//!
//! Settings are read from the process environment (optionally seeded from a
//! `.env` file by the binary) into a flat [`Settings`] struct, then turned into
//! the structured [`ServerConfig`] the rest of the crate consumes.

pub mod env_file;

use crate::error::{HomeAutomationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_NEST_API_URL: &str = "http://localhost:8081";
pub const DEFAULT_SDM_API_BASE: &str = "https://smartdevicemanagement.googleapis.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";
pub const DEFAULT_WEATHER_API_BASE: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_WEATHER_ONECALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";

/// Flat settings as they appear in the environment.
///
/// Keys are matched case-insensitively: `USE_REAL_NEST_API` and
/// `use_real_nest_api` both land in [`Settings::use_real_nest_api`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub use_real_nest_api: bool,
    pub nest_api_url: String,

    pub weather_api_key: Option<String>,
    pub weather_api_base: String,
    pub weather_onecall_url: String,

    pub google_project_id: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_access_token: Option<String>,
    pub google_refresh_token: Option<String>,
    pub google_api_base: String,
    pub google_token_url: String,

    pub request_timeout_secs: u64,

    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,

    pub env_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_real_nest_api: false,
            nest_api_url: DEFAULT_NEST_API_URL.to_string(),
            weather_api_key: None,
            weather_api_base: DEFAULT_WEATHER_API_BASE.to_string(),
            weather_onecall_url: DEFAULT_WEATHER_ONECALL_URL.to_string(),
            google_project_id: None,
            google_client_id: None,
            google_client_secret: None,
            google_access_token: None,
            google_refresh_token: None,
            google_api_base: DEFAULT_SDM_API_BASE.to_string(),
            google_token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            log_file: None,
            env_file: PathBuf::from(".env"),
        }
    }
}

impl Settings {
    /// Load settings from the current process environment
    pub fn from_env() -> Result<Self> {
        config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>())
            .map_err(|e| HomeAutomationError::config(format!("Invalid settings: {e}")))
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Thermostat backend selection
    pub backend: BackendConfig,

    /// Weather API configuration; weather tools are disabled when absent
    pub weather: Option<WeatherConfig>,

    /// Outbound HTTP configuration
    pub http: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// File refreshed access tokens are written back to
    pub env_file: PathBuf,
}

/// Which thermostat backend to talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Mock REST API
    Dummy(DummyApiConfig),
    /// Google Smart Device Management API
    Google(GoogleSdmConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyApiConfig {
    pub base_url: Url,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GoogleSdmConfig {
    pub project_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base: Url,
    pub token_url: Url,
}

impl fmt::Debug for GoogleSdmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleSdmConfig")
            .field("project_id", &self.project_id)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base.as_str())
            .field("token_url", &self.token_url.as_str())
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub api_base: Url,
    pub onecall_url: Url,
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base.as_str())
            .field("onecall_url", &self.onecall_url.as_str())
            .finish()
    }
}

/// Outbound HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    pub format: LogFormat,
    /// Optional log file, rotated daily
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|e| HomeAutomationError::config(format!("Invalid {name}: {e}")))
}

impl ServerConfig {
    /// Build the structured configuration from flat settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let backend = if settings.use_real_nest_api {
            let project_id = non_empty(&settings.google_project_id).ok_or_else(|| {
                HomeAutomationError::config(
                    "GOOGLE_PROJECT_ID is required when USE_REAL_NEST_API is enabled",
                )
            })?;
            let access_token = non_empty(&settings.google_access_token).ok_or_else(|| {
                HomeAutomationError::config(
                    "GOOGLE_ACCESS_TOKEN is required when USE_REAL_NEST_API is enabled",
                )
            })?;

            BackendConfig::Google(GoogleSdmConfig {
                project_id,
                access_token,
                refresh_token: non_empty(&settings.google_refresh_token),
                client_id: non_empty(&settings.google_client_id),
                client_secret: non_empty(&settings.google_client_secret),
                api_base: parse_url("GOOGLE_API_BASE", &settings.google_api_base)?,
                token_url: parse_url("GOOGLE_TOKEN_URL", &settings.google_token_url)?,
            })
        } else {
            BackendConfig::Dummy(DummyApiConfig {
                base_url: parse_url("NEST_API_URL", &settings.nest_api_url)?,
            })
        };

        let weather = match non_empty(&settings.weather_api_key) {
            Some(api_key) => Some(WeatherConfig {
                api_key,
                api_base: parse_url("WEATHER_API_BASE", &settings.weather_api_base)?,
                onecall_url: parse_url("WEATHER_ONECALL_URL", &settings.weather_onecall_url)?,
            }),
            None => None,
        };

        let format = match settings.log_format.trim().to_lowercase().as_str() {
            "" | "text" | "pretty" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(HomeAutomationError::config(format!(
                    "Invalid LOG_FORMAT: {other} (expected text or json)"
                )))
            }
        };

        let config = Self {
            backend,
            weather,
            http: HttpConfig {
                timeout: Duration::from_secs(settings.request_timeout_secs),
            },
            logging: LoggingConfig {
                level: settings.log_level.trim().to_lowercase(),
                format,
                file: settings.log_file.clone(),
            },
            env_file: settings.env_file.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the environment and validate
    pub fn from_env() -> Result<Self> {
        Self::from_settings(&Settings::from_env()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let check_scheme = |name: &str, url: &Url| {
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(HomeAutomationError::config(format!(
                    "{name} must use http or https scheme"
                )));
            }
            Ok(())
        };

        match &self.backend {
            BackendConfig::Dummy(dummy) => check_scheme("NEST_API_URL", &dummy.base_url)?,
            BackendConfig::Google(google) => {
                if google.project_id.is_empty() {
                    return Err(HomeAutomationError::config("Project ID cannot be empty"));
                }
                if google.access_token.is_empty() {
                    return Err(HomeAutomationError::config("Access token cannot be empty"));
                }
                check_scheme("GOOGLE_API_BASE", &google.api_base)?;
                check_scheme("GOOGLE_TOKEN_URL", &google.token_url)?;
            }
        }

        if let Some(weather) = &self.weather {
            check_scheme("WEATHER_API_BASE", &weather.api_base)?;
            check_scheme("WEATHER_ONECALL_URL", &weather.onecall_url)?;
        }

        if self.http.timeout.is_zero() {
            return Err(HomeAutomationError::config("Timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Whether the real vendor API is in use
    pub fn uses_real_api(&self) -> bool {
        matches!(self.backend, BackendConfig::Google(_))
    }
}
