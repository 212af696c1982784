// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide tracing setup

use crate::config::{ConfigError, LogConfig};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Build the filter: explicit directives, else `RUST_LOG`, else `info`
pub fn filter(config: &LogConfig) -> Result<EnvFilter, ConfigError> {
    match &config.filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| ConfigError::Invalid(format!("log filter {:?}: {}", directives, e))),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber
///
/// With a log file configured, returns the guard that flushes the
/// non-blocking writer; keep it alive for the life of the process.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = filter(config)?;

    let Some(path) = &config.file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ConfigError::Invalid(format!("logging already initialised: {}", e)))?;
        return Ok(None);
    };

    let invalid = || ConfigError::Invalid(format!("log file {} has no file name", path.display()));
    let file_name = path.file_name().ok_or_else(invalid)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("logging already initialised: {}", e)))?;

    Ok(Some(guard))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
