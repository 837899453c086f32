//! Tracing subscriber setup

use std::path::{Path, PathBuf};

use bulkload_domain::constants::FILE_TIMESTAMP_FORMAT;
use bulkload_domain::{BulkLoadError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Keeps the file writer flushing until dropped
///
/// Hold this for the lifetime of the process; dropping it flushes and stops
/// the background log writer.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Path of the log file being written, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Timestamp naming the log and result files of one run.
pub fn run_timestamp() -> String {
    chrono::Local::now().format(FILE_TIMESTAMP_FORMAT).to_string()
}

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. When `logs_dir`
/// is set, events are also written to `{logs_dir}/{timestamp}.log`.
///
/// # Errors
/// - `BulkLoadError::Resource` if the logs directory cannot be created
/// - `BulkLoadError::Internal` if a global subscriber is already installed
pub fn init_logging(logs_dir: Option<&Path>, timestamp: &str) -> Result<LoggingGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (file_layer, file_guard, log_file) = match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                BulkLoadError::Resource(format!("Failed to create logs dir {}: {e}", dir.display()))
            })?;
            let file_name = format!("{timestamp}.log");
            let appender = tracing_appender::rolling::never(dir, &file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_target(false).with_writer(writer);
            (Some(layer), Some(guard), Some(dir.join(file_name)))
        }
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| BulkLoadError::Internal(format!("Failed to install tracing subscriber: {e}")))?;

    if let Some(path) = &log_file {
        tracing::info!(path = %path.display(), "Logging to file");
    }

    Ok(LoggingGuard { _file: file_guard, log_file })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_matches_file_format() {
        let stamp = run_timestamp();

        // yy-mm-dd_HH-MM-SS
        assert_eq!(stamp.len(), 17);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(chrono::NaiveDateTime::parse_from_str(&stamp, FILE_TIMESTAMP_FORMAT).is_ok());
    }
}
