//! Home automation MCP server
//!
//! Exposes thermostat control and weather lookup as Model Context Protocol
//! tools over stdio.
//!
//! # Features
//!
//! - Two thermostat backends behind one trait: the mock REST API and Google
//!   Smart Device Management
//! - Short thermostat aliases (`1`, `thermostat-2`, `...EFGHIJKL`) resolved to
//!   full device paths
//! - Fahrenheit/Celsius and SDM trait normalization
//! - OAuth access token refresh on 401, persisted back to `.env`
//! - OpenWeatherMap current conditions, forecast and alerts

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod services;
pub mod tools;

// Test support modules - available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use config::ServerConfig;
pub use error::{HomeAutomationError, Result};
