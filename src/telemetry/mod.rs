//! Logging setup for the dashboard
//!
//! Structured `tracing` output through a `tracing-subscriber` registry:
//! an [`EnvFilter`] from `RUST_LOG` / `LOG_LEVEL` and either compact or
//! JSON formatting.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    pub service_version: String,
    /// Enable console logging
    pub enable_console: bool,
    /// Enable JSON logging format
    pub json_format: bool,
    /// Log level filter
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "truecred-dashboard".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            enable_console: true,
            json_format: false,
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "truecred-dashboard".to_string()),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            enable_console: std::env::var("LOG_CONSOLE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            json_format: std::env::var("LOG_JSON")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            log_level: std::env::var("LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if !config.enable_console {
        subscriber.try_init()?;
    } else if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);
        subscriber.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .compact();
        subscriber.with(fmt_layer).try_init()?;
    }

    Ok(())
}
