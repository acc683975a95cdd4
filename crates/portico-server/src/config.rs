// ABOUTME: Configuration loading and validation for the portico server.
// ABOUTME: Reads PORTICO_* environment variables with defaults; the CLI may override them.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORTICO_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("unknown log format {0:?}; expected pretty, compact or json")]
    InvalidLogFormat(String),

    #[error("PORTICO_SHUTDOWN_GRACE_SECS is not a whole number of seconds: {0}")]
    InvalidShutdownGrace(String),
}

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub log_format: LogFormat,
    /// Filter directive used when RUST_LOG is not set.
    pub log_filter: String,
    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
}

pub const DEFAULT_BIND: &str = "127.0.0.1:7340";
pub const DEFAULT_LOG_FILTER: &str = "portico=debug,portico_server=debug,tower_http=debug";
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

impl ServerConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - PORTICO_BIND: socket address to bind (default: 127.0.0.1:7340)
    /// - PORTICO_LOG_FORMAT: pretty, compact or json (default: pretty)
    /// - PORTICO_LOG_FILTER: tracing filter when RUST_LOG is unset
    /// - PORTICO_SHUTDOWN_GRACE_SECS: drain window after a signal (default: 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_str =
            std::env::var("PORTICO_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let log_format = match std::env::var("PORTICO_LOG_FORMAT") {
            Ok(v) if !v.is_empty() => v.parse()?,
            _ => LogFormat::default(),
        };

        let log_filter = std::env::var("PORTICO_LOG_FILTER")
            .ok()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let shutdown_grace = match std::env::var("PORTICO_SHUTDOWN_GRACE_SECS") {
            Ok(v) if !v.is_empty() => Duration::from_secs(
                v.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidShutdownGrace(v.clone()))?,
            ),
            _ => Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        };

        Ok(Self {
            bind,
            log_format,
            log_filter,
            shutdown_grace,
        })
    }
}
