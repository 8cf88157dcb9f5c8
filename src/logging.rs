//! Logging sinks.
//!
//! Library code only emits `tracing` events. Each command installs its own
//! append-only log file as the sink; tests install an in-memory writer
//! through [`subscriber_with_writer`] and assert on the captured text.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Log file written by the ingestion command.
pub const INGEST_LOG_FILE: &str = "ingestion_db.log";

/// Log file written by the vendor summary command.
pub const SUMMARY_LOG_FILE: &str = "get_vendor_summary.log";

const DEFAULT_FILTER: &str = "debug";

/// Builds a subscriber that formats events as `timestamp LEVEL message`
/// into any writer.
pub fn subscriber_with_writer<W>(writer: W, filter: EnvFilter) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .finish()
}

/// Builds a subscriber appending to `log_dir/file_name`.
/// Creates the directory if needed; existing log content is kept.
pub fn file_subscriber(
    log_dir: &Path,
    file_name: &str,
    filter: EnvFilter,
) -> Result<impl Subscriber + Send + Sync, AppError> {
    fs::create_dir_all(log_dir).map_err(|e| {
        AppError::Io(format!("Failed to create log directory {}: {}", log_dir.display(), e))
    })?;

    let path = log_dir.join(file_name);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| AppError::Io(format!("Failed to open log file {}: {}", path.display(), e)))?;

    Ok(subscriber_with_writer(Mutex::new(file), filter))
}

/// Installs the file sink as the process-wide subscriber.
pub fn init_file_logging(log_dir: &Path, file_name: &str) -> Result<(), AppError> {
    let subscriber = file_subscriber(log_dir, file_name, env_filter())?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Internal(format!("Failed to install log subscriber: {e}")))
}

/// `RUST_LOG` when set, otherwise everything at debug and above.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}


#[cfg(test)]
mod tests {
    use super::capture::CapturedLogs;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn captured_sink_records_level_and_message() {
        let logs = CapturedLogs::default();
        logs.capture(|| {
            tracing::info!("Creating Vendor Summary Table...");
            tracing::warn!(rows = 3, "Appending to existing table");
        });

        let text = logs.contents();
        assert!(text.contains("INFO"));
        assert!(text.contains("Creating Vendor Summary Table..."));
        assert!(text.contains("WARN"));
        assert!(text.contains("rows=3"));
    }

    #[test]
    fn file_sink_appends_across_subscribers() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");

        for message in ["first run", "second run"] {
            let subscriber =
                file_subscriber(&log_dir, INGEST_LOG_FILE, EnvFilter::new("info")).unwrap();
            tracing::subscriber::with_default(subscriber, || tracing::info!("{}", message));
        }

        let text = fs::read_to_string(log_dir.join(INGEST_LOG_FILE)).unwrap();
        assert!(text.contains("first run"));
        assert!(text.contains("second run"));
        assert_eq!(text.lines().count(), 2);
    }
}
