//! Vendor summary builder.
//!
//! Aggregates freight, purchases and sales from the loaded base tables,
//! merges them into one row per vendor/brand purchase group, cleans the
//! result and writes it back through the chunked loader.

mod aggregate;
mod clean;
#[cfg(test)]
pub(crate) mod fixtures;

use tracing::warn;

use crate::error::AppError;
use crate::frame::Table;
use crate::loader::{load_table, LoadOptions, LoadReport, Source, WriteMode};
use crate::storage::Store;

pub use aggregate::{
    build_summary, freight_by_vendor, merge, purchases_by_vendor_brand, sales_by_vendor_brand,
    ORDER_COLUMN,
};
pub use clean::clean;

/// Table the cleaned summary is written to.
pub const SUMMARY_TABLE: &str = "vendor_sales_summary";

/// Writes the cleaned summary to [`SUMMARY_TABLE`].
///
/// In append mode an existing summary is kept, so running twice without a
/// reset duplicates every row; a warning is logged when that happens.
pub fn write_summary(
    store: &mut Store,
    summary: &Table,
    options: &LoadOptions,
) -> Result<LoadReport, AppError> {
    if options.mode == WriteMode::Append && store.table_exists(SUMMARY_TABLE)? {
        let existing = store.row_count(SUMMARY_TABLE)?;
        if existing > 0 {
            warn!(
                existing_rows = existing,
                "[SUMMARY] Appending to a non-empty {}; rows from earlier runs are kept",
                SUMMARY_TABLE
            );
        }
    }

    load_table(store, Source::Frame(summary), SUMMARY_TABLE, options)
}

#[cfg(test)]
mod tests {
    use super::fixtures::{load_fixture, FixtureData};
    use super::*;
    use crate::logging::capture::CapturedLogs;
    use crate::streaming::ChunkConfig;
    use rusqlite::types::Value;

    fn options(mode: WriteMode) -> LoadOptions {
        LoadOptions::new(ChunkConfig::with_chunk_size(1), mode)
    }

    #[test]
    fn written_summary_matches_cleaned_table() {
        let mut store = load_fixture(&FixtureData::standard());
        let cleaned = clean(build_summary(&store).unwrap()).unwrap();

        let report = write_summary(&mut store, &cleaned, &options(WriteMode::Append)).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(store.table_columns(SUMMARY_TABLE).unwrap(), cleaned.columns().to_vec());

        let stored = store
            .query("SELECT GrossProfit, ProfitMargin FROM vendor_sales_summary ORDER BY rowid")
            .unwrap();
        assert_eq!(stored.value(1, "GrossProfit").unwrap(), &Value::Real(-100.0));
        assert_eq!(stored.value(1, "ProfitMargin").unwrap(), &Value::Real(f64::NEG_INFINITY));

        let types = store
            .query("SELECT type FROM pragma_table_info('vendor_sales_summary') WHERE name = 'TotalSalesQuantity'")
            .unwrap();
        assert_eq!(types.value(0, "type").unwrap(), &Value::Text("REAL".into()));
    }

    #[test]
    fn append_mode_duplicates_and_warns() {
        let mut store = load_fixture(&FixtureData::standard());
        let cleaned = clean(build_summary(&store).unwrap()).unwrap();
        let logs = CapturedLogs::default();

        logs.capture(|| {
            write_summary(&mut store, &cleaned, &options(WriteMode::Append)).unwrap();
            write_summary(&mut store, &cleaned, &options(WriteMode::Append)).unwrap();
        });

        assert_eq!(store.row_count(SUMMARY_TABLE).unwrap(), 4);
        assert!(logs.contents().contains("Appending to a non-empty vendor_sales_summary"));
    }

    #[test]
    fn replace_mode_keeps_one_copy() {
        let mut store = load_fixture(&FixtureData::standard());
        let cleaned = clean(build_summary(&store).unwrap()).unwrap();

        write_summary(&mut store, &cleaned, &options(WriteMode::Replace)).unwrap();
        write_summary(&mut store, &cleaned, &options(WriteMode::Replace)).unwrap();

        assert_eq!(store.row_count(SUMMARY_TABLE).unwrap(), 2);
    }
}
