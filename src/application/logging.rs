//! # Logging
//!
//! Sets up the global `tracing` subscriber: a plain-text session log under the data directory,
//! cleared at every start, plus colored output on stdout.
//! `RUST_LOG` overrides the default filter, which keeps the Matrix SDK quiet.

use crate::domain::config::SystemConfig;
use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const DEFAULT_FILTER: &str =
    "info,matrix_sdk=warn,matrix_sdk_base=warn,matrix_sdk_crypto=error,ruma=warn,hyper=warn";

/// Installs the subscriber. Keep the returned guard alive until exit so the file log is flushed.
pub fn init_logging(system: &SystemConfig) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&system.data_dir).with_context(|| {
        format!("Failed to create data directory {}", system.data_dir.display())
    })?;

    // Clear previous session log
    let log_path = system.data_dir.join(&system.log_file);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(&system.data_dir, &system.log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    Ok(guard)
}
