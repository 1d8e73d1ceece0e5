//! File logging.  stdout belongs to the interface, so logs only go to a file, and only when one is
//! configured.

use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        env = "CHATTERM_LOG_LEVEL",
        default_value_t = LogLevel::Info,
        help = "Minimum log level (error, warn, info, debug, trace); RUST_LOG overrides it"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "CHATTERM_LOG_FILE",
        help = "Append logs to this file (no logging without it)"
    )]
    pub file: Option<PathBuf>,
}

/// Install the global subscriber.  The returned guard flushes buffered lines when dropped, so
/// hold it for as long as the program runs.
pub fn init(args: &LoggingArgs) -> Result<Option<WorkerGuard>, AppError> {
    let path = match &args.file {
        Some(path) => path,
        None => return Ok(None),
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logging(format!("{}: {}", path.display(), e)))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.level.as_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_file_means_no_subscriber() {
        let args = LoggingArgs {
            level: LogLevel::Debug,
            file: None,
        };
        assert!(init(&args).unwrap().is_none());
    }

    #[test]
    fn unwritable_file_is_an_error() {
        let args = LoggingArgs {
            level: LogLevel::Info,
            file: Some(PathBuf::from("/nonexistent-dir/chatterm.log")),
        };
        assert!(matches!(init(&args), Err(AppError::Logging(_))));
    }

    #[test]
    fn levels_map_to_filter_directives() {
        assert_eq!(LogLevel::Warn.as_directive(), "warn");
        assert_eq!(LogLevel::Trace.as_directive(), "trace");
    }
}
