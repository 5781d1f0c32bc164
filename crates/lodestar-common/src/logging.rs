//! Logging bootstrap for lodestar
//!
//! Library code only emits `tracing` events. Binaries and test suites install a
//! subscriber through [`init`] or [`try_init_for_tests`]:
//!
//! ```rust,ignore
//! use lodestar_common::logging::{self, LogLevel, LogOptions};
//!
//! logging::init(LogOptions {
//!     level: Some(LogLevel::Debug),
//!     ..LogOptions::default()
//! })?;
//! ```
//!
//! Without an explicit level the `RUST_LOG` environment variable decides, falling
//! back to `info`.

use tracing_subscriber::EnvFilter;

/// Log levels accepted by [`LogOptions`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Parse log level from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" | "WARNING" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Filter directive understood by `EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Minimum log level; `None` defers to `RUST_LOG`
    pub level: Option<LogLevel>,
    /// Include the event target (module path) in each line
    pub with_target: bool,
    /// Emit ANSI colours
    pub ansi: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: None,
            with_target: true,
            ansi: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {message}")]
    SubscriberInstall { message: String },
}

fn build_filter(level: Option<LogLevel>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Install the global `tracing` subscriber. Fails if one is already installed.
pub fn init(options: LogOptions) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(options.level))
        .with_target(options.with_target)
        .with_ansi(options.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| LoggingError::SubscriberInstall {
            message: e.to_string(),
        })
}

/// Install a subscriber that writes through the test harness capture.
/// Safe to call from every test; only the first call has an effect.
pub fn try_init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(None))
        .with_test_writer()
        .try_init();
}

/// Format an error with cause chain
pub fn format_error(error: &(dyn std::error::Error + 'static)) -> String {
    format_error_recursive(error, 0)
}

fn format_error_recursive(error: &(dyn std::error::Error + 'static), depth: usize) -> String {
    const MAX_DEPTH: usize = 10;

    if depth >= MAX_DEPTH {
        return error.to_string();
    }

    let base = error.to_string();

    if let Some(source) = error.source() {
        format!("{} Caused by: {}", base, format_error_recursive(source, depth + 1))
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::from_str("info"), Some(LogLevel::Info));
        assert_eq!(LogLevel::from_str(" warning "), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_str("trace"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::from_str("invalid"), None);
    }

    #[test]
    fn test_level_round_trips_through_directive() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(LogLevel::from_str(level.as_str()), Some(level));
        }
    }

    #[test]
    fn test_try_init_for_tests_is_repeatable() {
        try_init_for_tests();
        try_init_for_tests();
        tracing::debug!("logging initialised twice without panicking");
    }

    #[test]
    fn test_init_fails_once_a_subscriber_is_installed() {
        try_init_for_tests();
        let result = init(LogOptions {
            level: Some(LogLevel::Debug),
            ..LogOptions::default()
        });
        assert!(matches!(result, Err(LoggingError::SubscriberInstall { .. })));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_error_formatting() {
        let error = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };

        let formatted = format_error(&error);
        assert_eq!(formatted, "outer failure Caused by: file not found");
    }
}
