//! Loads every CSV file of the data directory into the SQLite store.

use std::process::ExitCode;

use vendor_summary::commands::{ingest, report_error};
use vendor_summary::config::Config;
use vendor_summary::error::AppError;
use vendor_summary::logging::{self, INGEST_LOG_FILE};
use vendor_summary::storage::Store;

fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    logging::init_file_logging(&config.log_dir, INGEST_LOG_FILE)?;

    let mut store = Store::open(&config.database_path)?;
    let report = ingest(&mut store, &config).inspect_err(|e| {
        tracing::error!(error = %e, "Ingestion failed");
    })?;

    for table in &report.tables {
        println!("Ingested {} rows into {}", table.rows, table.table_name);
    }
    println!(
        "Loaded {} tables in {:.2} minutes",
        report.tables.len(),
        report.elapsed.as_secs_f64() / 60.0
    );
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
