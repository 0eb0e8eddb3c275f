//! Tracing setup for the client binary.
use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::dirs;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "conflict=info,war_core=info";

/// Logs to stderr, and to a daily rolling file when enabled.
pub fn setup_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let log_dir = dirs::log_dir();
    let file_layer = if config.to_file {
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&log_dir, "conflict.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        // Leak the guard to keep the file writer alive for the whole process.
        std::mem::forget(guard);
        Some(fmt::layer().with_writer(writer).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if config.to_file {
        tracing::info!("Log file: {}/conflict.log", log_dir.display());
    }
    Ok(())
}
