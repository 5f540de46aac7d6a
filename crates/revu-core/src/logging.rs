//! File logging setup.
//!
//! The TUI owns the terminal, so diagnostics go to daily-rolling files under
//! ${REVU_HOME}/logs instead of stdout/stderr.

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{Config, paths};

/// Env var that overrides the configured log filter.
pub const LOG_FILTER_ENV: &str = "REVU_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

/// Initializes file logging.
///
/// Filter precedence: REVU_LOG env var, then `log_filter` from config, then
/// "info". Returns the guard that flushes buffered lines on drop; keep it
/// alive for the lifetime of the process.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let logs_dir = paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "revu.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let directive = std::env::var(LOG_FILTER_ENV)
        .ok()
        .or_else(|| config.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter: {directive}"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
