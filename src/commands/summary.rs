//! Vendor summary build: aggregate, clean, write back.

use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::loader::LoadReport;
use crate::storage::Store;
use crate::summary::{build_summary, clean, write_summary};

const SAMPLE_ROWS: usize = 5;

/// Builds the vendor sales summary from the base tables in `store` and
/// writes it to `vendor_sales_summary`.
pub fn vendor_summary(store: &mut Store, config: &Config) -> Result<LoadReport, AppError> {
    info!("Creating Vendor Summary Table...");
    let summary = build_summary(store)?;
    info!("Sample Data:\n{}", summary.head(SAMPLE_ROWS));

    info!("Cleaning Data...");
    let cleaned = clean(summary)?;
    info!("Cleaned Data Sample:\n{}", cleaned.head(SAMPLE_ROWS));

    info!("Ingesting data into database...");
    let report = write_summary(store, &cleaned, &config.summary_options())?;

    info!("Process Completed Successfully.");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture::CapturedLogs;
    use crate::summary::fixtures::{load_fixture, FixtureData};
    use crate::summary::SUMMARY_TABLE;

    const STAGES: [&str; 6] = [
        "Creating Vendor Summary Table...",
        "Sample Data:",
        "Cleaning Data...",
        "Cleaned Data Sample:",
        "Ingesting data into database...",
        "Process Completed Successfully.",
    ];

    #[test]
    fn logs_every_stage_in_order() {
        let mut store = load_fixture(&FixtureData::standard());
        let logs = CapturedLogs::default();

        let report = logs
            .capture(|| vendor_summary(&mut store, &Config::default()))
            .unwrap();

        assert_eq!(report.table_name, SUMMARY_TABLE);
        assert_eq!(report.rows, 2);

        let text = logs.contents();
        let positions: Vec<usize> = STAGES
            .iter()
            .map(|stage| {
                text.find(stage)
                    .unwrap_or_else(|| panic!("No {:?} in log:\n{}", stage, text))
            })
            .collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "Stages logged out of order:\n{}",
            text
        );
    }

    #[test]
    fn failure_stops_before_completion_message() {
        let mut store = Store::open_in_memory().unwrap();
        let logs = CapturedLogs::default();

        let result = logs.capture(|| vendor_summary(&mut store, &Config::default()));

        assert!(matches!(result, Err(AppError::Database(_))));
        let text = logs.contents();
        assert!(text.contains("Creating Vendor Summary Table..."));
        assert!(!text.contains("Process Completed Successfully."));
        assert!(!store.table_exists(SUMMARY_TABLE).unwrap());
    }
}
