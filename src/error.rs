//! Error types for the home automation MCP server
//!
//! Every backend operation returns [`Result`]; the tool layer is the only
//! place where errors are turned into caller-visible text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for home automation operations
pub type Result<T> = std::result::Result<T, HomeAutomationError>;

/// Error types for thermostat, weather and protocol operations
#[derive(Error, Debug)]
pub enum HomeAutomationError {
    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Authentication errors (401 after the single refresh retry)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors, raised before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown device
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-2xx response from an upstream API
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),

    /// Parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Connection errors (1000-1099)
    ConnectionTimeout,
    ConnectionLost,

    // Authentication errors (1100-1199)
    InvalidCredentials,

    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Device errors (1300-1399)
    DeviceNotFound,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,

    // Service errors (1600-1699)
    ExternalServiceError,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConnectionTimeout => 1001,
            ErrorCode::ConnectionLost => 1003,
            ErrorCode::InvalidCredentials => 1101,
            ErrorCode::ConfigurationInvalid => 1202,
            ErrorCode::DeviceNotFound => 1301,
            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,
            ErrorCode::ExternalServiceError => 1603,
            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1000..=1099 => "connection",
            1100..=1199 => "authentication",
            1200..=1299 => "configuration",
            1300..=1399 => "device",
            1400..=1499 => "data",
            1600..=1699 => "service",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Medium severity - warning condition
    Warning,
    /// High severity - error condition
    Error,
    /// Critical severity - immediate attention required
    Critical,
}

impl HomeAutomationError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an upstream error from a response status and body
    pub fn upstream<S: Into<String>>(status: u16, msg: S) -> Self {
        Self::Upstream {
            status,
            message: msg.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a parsing error
    pub fn parsing_error<S: Into<String>>(msg: S) -> Self {
        Self::Parsing(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Generic(anyhow::anyhow!(msg.into()))
    }

    /// Classify a transport failure from reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("HTTP request failed: {err}"))
        } else if err.is_connect() {
            Self::connection(format!("HTTP request failed: {err}"))
        } else {
            Self::Http(err)
        }
    }

    /// Map the error to a structured error code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            HomeAutomationError::Connection(_) => ErrorCode::ConnectionLost,
            HomeAutomationError::Authentication(_) => ErrorCode::InvalidCredentials,
            HomeAutomationError::Config(_) => ErrorCode::ConfigurationInvalid,
            HomeAutomationError::NotFound(_) => ErrorCode::DeviceNotFound,
            HomeAutomationError::Upstream { .. } => ErrorCode::ExternalServiceError,
            HomeAutomationError::InvalidInput(_) => ErrorCode::InvalidInput,
            HomeAutomationError::Timeout(_) => ErrorCode::ConnectionTimeout,
            HomeAutomationError::Parsing(_) | HomeAutomationError::Json(_) => {
                ErrorCode::ParsingFailed
            }
            HomeAutomationError::Http(_) => ErrorCode::ExternalServiceError,
            HomeAutomationError::Io(_) | HomeAutomationError::Generic(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HomeAutomationError::Authentication(_) => ErrorSeverity::Critical,
            HomeAutomationError::Config(_) | HomeAutomationError::NotFound(_) => {
                ErrorSeverity::Error
            }
            HomeAutomationError::Connection(_) | HomeAutomationError::Timeout(_) => {
                ErrorSeverity::Warning
            }
            HomeAutomationError::InvalidInput(_) | HomeAutomationError::Parsing(_) => {
                ErrorSeverity::Warning
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            HomeAutomationError::Connection(_)
            | HomeAutomationError::Timeout(_)
            | HomeAutomationError::Http(_) => true,
            HomeAutomationError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Error logging utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Log an error with the severity it maps to
    pub fn log_error(error: &HomeAutomationError, component: &str, operation: &str) {
        let code = error.to_error_code();
        let code_number = code.as_number();
        let category = code.category();

        match error.severity() {
            ErrorSeverity::Critical => {
                tracing::error!(
                    error_code = code_number,
                    category,
                    component,
                    operation,
                    retryable = error.is_retryable(),
                    "Critical error occurred: {error}"
                );
            }
            ErrorSeverity::Error => {
                tracing::error!(
                    error_code = code_number,
                    category,
                    component,
                    operation,
                    "Error occurred: {error}"
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error_code = code_number,
                    category,
                    component,
                    operation,
                    "Warning: {error}"
                );
            }
        }
    }
}

/// Macro for easy structured error logging
#[macro_export]
macro_rules! log_structured_error {
    ($error:expr, $component:expr, $operation:expr) => {
        $crate::error::ErrorReporter::log_error(&$error, $component, $operation)
    };
}
