//! Logging configuration

use std::fmt;
use std::path::PathBuf;

use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::ConnectError;

/// File name used when logging to a directory
pub const LOG_FILE_NAME: &str = "connectapi.log";

/// Log level configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_filter_string(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_filter_string())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// Logging options
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: LogLevel,

    /// Also write plain-text logs to `{log_dir}/connectapi.log`
    pub log_dir: Option<PathBuf>,

    /// Emit JSON lines on stderr
    pub json_format: bool,
}

/// Initialize logging
///
/// Console output goes to stderr so stdout stays free for command results.
pub fn init_logging(options: LogOptions) -> Result<(), ConnectError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.to_filter_string()));

    let file_layer = options.log_dir.as_ref().map(|dir| {
        tracing_fmt::layer()
            .with_ansi(false)
            .with_writer(tracing_appender::rolling::never(dir, LOG_FILE_NAME))
    });

    let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);

    if options.json_format {
        subscriber
            .with(tracing_fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ConnectError::Config(e.to_string()))?;
    } else {
        subscriber
            .with(tracing_fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ConnectError::Config(e.to_string()))?;
    }

    Ok(())
}
