//! Structured logging with tracing
//!
//! Centralized logging setup for the runtime. Binaries and tests call
//! [`init_logging`] once; library code just emits `tracing` events.

use conflux_domain::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Emit JSON-formatted events instead of the human layout
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Initialize logging with the provided configuration
///
/// The `CONFLUX_LOG` environment variable overrides the configured
/// level with a full filter directive.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_env("CONFLUX_LOG").unwrap_or_else(|_| EnvFilter::new(&config.level));

    // json and plain fmt layers have different types, hence two branches
    let result = if config.json_format {
        let stdout = fmt::layer().json().with_target(true);
        Registry::default().with(filter).with(stdout).try_init()
    } else {
        let stdout = fmt::layer().with_target(true);
        Registry::default().with(filter).with(stdout).try_init()
    };
    result.map_err(|err| Error::config_with_source("failed to initialize logging", err))
}

/// Parse a log level string into a tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(Error::config(format!("invalid log level '{other}'"))),
    }
}
