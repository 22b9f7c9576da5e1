//! Tracing setup for the agent binary.
//!
//! Console output goes to stderr and honours `RUST_LOG`. When `BCV_LOG_DIR`
//! is set, the same events are also written to a daily-rotated file there.

use crate::error::{AgentError, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Directory for log files. Unset means console only.
pub const ENV_LOG_DIR: &str = "BCV_LOG_DIR";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "bcv_agent=info,bcv_scrape=info";

const LOG_FILE_NAME: &str = "bcv-agent.log";

/// Log directory from the environment, if one is configured.
pub fn log_dir_from_env() -> Option<PathBuf> {
    std::env::var(ENV_LOG_DIR)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive until
/// the process exits.
///
/// # Errors
///
/// Returns [`AgentError::Config`] if the log directory cannot be created or a
/// global subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(env_filter());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                AgentError::Config(format!("cannot create log dir {}: {e}", dir.display()))
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AgentError::Config(format!("failed to install logger: {e}")))?;

    if let Some(dir) = log_dir {
        tracing::info!(dir = %dir.display(), "logging to file");
    }

    Ok(guard)
}
