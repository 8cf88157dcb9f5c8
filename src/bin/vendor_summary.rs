//! Builds the vendor sales summary table from the loaded base tables.

use std::process::ExitCode;

use vendor_summary::commands::{report_error, vendor_summary};
use vendor_summary::config::Config;
use vendor_summary::error::AppError;
use vendor_summary::logging::{self, SUMMARY_LOG_FILE};
use vendor_summary::storage::Store;

fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    logging::init_file_logging(&config.log_dir, SUMMARY_LOG_FILE)?;

    let mut store = Store::open(&config.database_path)?;
    let report = vendor_summary(&mut store, &config).inspect_err(|e| {
        tracing::error!(error = %e, "Vendor summary failed");
    })?;

    println!("Wrote {} rows to {}", report.rows, report.table_name);
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}
