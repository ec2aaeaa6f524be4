//! Home Automation MCP Server - Main Entry Point
//!
//! Speaks MCP over stdio. Configuration comes from the environment, seeded
//! from a `.env` file when one exists.

use home_automation_mcp::{
    config::Settings,
    logging::init_logging,
    server::{create_handler, serve_stdio, HomeAutomationBackend},
    HomeAutomationError, Result, ServerConfig,
};

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// Home Automation MCP Server Configuration
#[derive(Parser, Debug)]
#[command(name = "home-automation-mcp")]
#[command(about = "MCP server for thermostat control and weather lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Config {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Environment file to load settings from and persist refreshed tokens to
    #[arg(long, env = "ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Use the Google Smart Device Management API instead of the mock API
    #[arg(long)]
    real_api: bool,
}

impl Config {
    /// Load the environment file (if any) and merge CLI overrides into the settings
    fn load_settings(&self) -> Result<Settings> {
        match dotenvy::from_path(&self.env_file) {
            Ok(()) => {}
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(HomeAutomationError::config(format!(
                    "Failed to load {}: {e}",
                    self.env_file.display()
                )))
            }
        }

        let mut settings = Settings::from_env()?;
        if self.debug {
            settings.log_level = "debug".to_string();
        }
        if self.real_api {
            settings.use_real_nest_api = true;
        }
        settings.env_file = self.env_file.clone();
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let settings = config.load_settings()?;
    let server_config = ServerConfig::from_settings(&settings)?;

    init_logging(&server_config.logging)
        .map_err(|e| HomeAutomationError::config(format!("Failed to initialize logging: {e}")))?;

    info!(
        "🚀 Starting Home Automation MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let backend = HomeAutomationBackend::from_config(&server_config).await?;
    let tools = backend.tools().clone();

    let handler = match create_handler(backend).await {
        Ok(handler) => handler,
        Err(e) => {
            tools.close().await;
            return Err(e);
        }
    };

    let outcome = tokio::select! {
        result = serve_stdio(handler) => result,
        () = shutdown_signal() => Ok(()),
    };

    tools.close().await;

    match &outcome {
        Ok(()) => info!("✅ Server stopped"),
        Err(e) => error!("❌ Server error: {e}"),
    }
    outcome
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("🛑 Interrupted, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("🛑 Terminated, shutting down");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
