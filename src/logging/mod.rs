//! Structured logging setup built on the tracing crate.
//!
//! Initialized once at startup from [`LoggingConfig`]; a second call against
//! an already-set global subscriber is tolerated so tests and embedding
//! applications can both call [`init`].

use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogLevel, LoggingConfig};

#[derive(Debug, Error)]
pub enum LogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("subscriber error: {0}")]
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, LogError>;

// Keeps the non-blocking file writer flushing for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the global subscriber from configuration.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config.level);

    let result = match config.format {
        LogFormat::Json => init_json(filter, config),
        LogFormat::Compact => init_compact(filter, config),
        _ => init_pretty(filter, config),
    };

    // A subscriber set earlier in the process wins silently.
    if let Err(LogError::Subscriber(ref e)) = result {
        if e.to_string().contains("global default trace dispatcher") {
            return Ok(());
        }
    }
    result
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
}

fn init_json(filter: EnvFilter, config: &LoggingConfig) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    match file_writer(config)? {
        Some(writer) => subscriber
            .with_writer(writer)
            .try_init()
            .map_err(LogError::Subscriber),
        None => subscriber.try_init().map_err(LogError::Subscriber),
    }
}

fn init_compact(filter: EnvFilter, config: &LoggingConfig) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(true);

    match file_writer(config)? {
        Some(writer) => subscriber
            .with_writer(writer)
            .try_init()
            .map_err(LogError::Subscriber),
        None => subscriber.try_init().map_err(LogError::Subscriber),
    }
}

fn init_pretty(filter: EnvFilter, config: &LoggingConfig) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true);

    match file_writer(config)? {
        Some(writer) => subscriber
            .with_writer(writer)
            .try_init()
            .map_err(LogError::Subscriber),
        None => subscriber.try_init().map_err(LogError::Subscriber),
    }
}

/// Non-blocking file writer when a log file is configured and stdout is not
/// forced. Only one writer can feed a fmt subscriber, so stdout wins when
/// both are requested.
fn file_writer(config: &LoggingConfig) -> Result<Option<NonBlocking>> {
    let Some(path) = &config.file else {
        return Ok(None);
    };
    if config.stdout {
        return Ok(None);
    }

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let appender = tracing_appender::rolling::never(
        path.parent().unwrap_or_else(|| Path::new(".")),
        path.file_name().unwrap_or_default(),
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    Ok(Some(writer))
}

/// Parse a log level string.
pub fn parse_log_level(level: &str) -> Result<LogLevel> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(LogLevel::Trace),
        "debug" => Ok(LogLevel::Debug),
        "info" => Ok(LogLevel::Info),
        "warn" => Ok(LogLevel::Warn),
        "error" => Ok(LogLevel::Error),
        _ => Err(LogError::InvalidLogLevel(level.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_log_level("info").unwrap(), LogLevel::Info);
        assert_eq!(parse_log_level("WARN").unwrap(), LogLevel::Warn);
        assert!(parse_log_level("verbose").is_err());
    }

    #[test]
    fn init_tolerates_repeat_calls() {
        let config = LoggingConfig::default();
        let _ = init(&config);
        // second call must not error even though a subscriber is set
        assert!(init(&config).is_ok());
    }
}
