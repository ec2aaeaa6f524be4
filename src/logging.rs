//! Logging setup
//!
//! stdout carries the MCP protocol, so every log layer writes to stderr or to
//! a daily-rotated file.

use crate::config::{LogFormat, LoggingConfig};
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn output_layer<W>(writer: W, format: LogFormat, ansi: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
    }
}

/// Build the env filter, RUST_LOG wins over the configured level
pub fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging with the given configuration
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut layers: Vec<BoxedLayer> = vec![output_layer(std::io::stderr, config.format, true)];

    if let Some(file_path) = &config.file {
        let parent = file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let file_name = file_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("home-automation-mcp.log"));
        let file_appender = tracing_appender::rolling::daily(parent, file_name);
        layers.push(output_layer(file_appender, config.format, false));
    }

    let subscriber = tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(&config.level));

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
