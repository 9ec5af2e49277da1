use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "BANDR_LOG";

pub fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(format!("bandr={level}")))
        .unwrap_or_else(|_| EnvFilter::new("bandr=info"))
}

/// Route tracing output to a daily rolling file under `dir`. The terminal
/// belongs to the UI, so nothing is written to stdout. Keep the returned
/// guard alive until exit or buffered lines are lost.
pub fn init(dir: &Path, level: &str) -> Result<WorkerGuard> {
    fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, "bandr.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(filter(level))
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
