//! Logging setup.
//!
//! - Writes to `logs/quake.log` (cleared on every start)
//! - Optionally mirrors to stderr for the non-interactive commands
//! - Level comes from `RUST_LOG` (defaults to `info`)

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::AppError;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "quake.log";

/// Where log lines go besides the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// The TUI owns the terminal; nothing may be written to it.
    FileOnly,
    FileAndStderr,
}

/// Keep alive for as long as logging is needed; dropping it flushes the file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging under [`DEFAULT_LOG_DIR`].
pub fn init(target: LogTarget) -> Result<LoggingGuard, AppError> {
    init_in(Path::new(DEFAULT_LOG_DIR), DEFAULT_LOG_FILE, target)
}

pub fn init_in(log_dir: &Path, log_file: &str, target: LogTarget) -> Result<LoggingGuard, AppError> {
    prepare_log_file(log_dir, log_file)
        .map_err(|e| AppError::io(format!("Failed to prepare log file in '{}': {e}", log_dir.display())))?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stderr_layer = match target {
        LogTarget::FileOnly => None,
        LogTarget::FileAndStderr => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        ),
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| AppError::io(format!("Failed to install log subscriber: {e}")))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create the directory and truncate the previous session's log.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<()> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")
}
