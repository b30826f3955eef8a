//! `tracing` setup for the binary.
//!
//! Human-readable events go to stderr, filtered by `RUST_LOG` or the verbosity
//! flag. An optional log file receives debug events from this project's crates
//! regardless of the stderr filter.

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEBUG_FILTER: &str = "info,quire=debug,quire_core=debug";

/// Installs the global subscriber.
///
/// The returned guard flushes the log file on drop and must be held until exit.
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let default_filter = if verbose { DEBUG_FILTER } else { "info" };
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false).with_filter(stderr_filter);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().context("log file path has no file name")?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

            let (writer, guard) = tracing_appender::non_blocking(rolling::never(dir, file_name));
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_filter(EnvFilter::new(DEBUG_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    Ok(guard)
}
