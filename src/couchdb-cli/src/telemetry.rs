//! Logging setup for the command line client
//!
//! Human-readable output always goes to stderr so that stdout carries only
//! command results. When a log directory is configured, JSON records are
//! also written there with size and daily rotation.

use anyhow::Result;
use couchdb_rs::couchdb_core::config::LoggingConfig;
use rolling_file::{RollingConditionBasic, RollingFileAppender};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "couchdb_cli=info,couchdb_rs=info,couchdb_core=info";

fn console_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
}

/// Initialize tracing
///
/// Returns the file writer guard when file logging is on; keep it alive
/// until exit so buffered records are flushed.
pub fn init_telemetry(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(config.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    })?;

    let Some(dir) = &config.dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer())
            .try_init()?;
        return Ok(None);
    };

    let log_dir = Path::new(dir);
    std::fs::create_dir_all(log_dir)?;

    // Rotates at 10 MB or daily, whichever comes first
    let file_appender = RollingFileAppender::new(
        log_dir.join("couchdb-cli.log"),
        RollingConditionBasic::new()
            .daily()
            .max_size(10 * 1024 * 1024),
        9,
    )?;
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_current_span(true)
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer())
        .try_init()?;

    tracing::debug!("File logging to {:?}", log_dir);
    Ok(Some(guard))
}
