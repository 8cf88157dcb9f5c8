//! Raw data ingestion: every source file into its own table.

use tracing::info;

use crate::config::Config;
use crate::error::AppError;
use crate::loader::{load_all, IngestReport, Manifest};
use crate::storage::Store;

/// Resolves the files to load: the JSON manifest when configured, otherwise
/// every CSV file in the data directory.
pub fn manifest_for(config: &Config) -> Result<Manifest, AppError> {
    match &config.manifest_path {
        Some(path) => {
            info!(manifest = %path.display(), "Using manifest");
            Manifest::from_json_file(path)
        }
        None => Manifest::from_dir(&config.data_dir),
    }
}

/// Loads every configured source into `store`.
pub fn ingest(store: &mut Store, config: &Config) -> Result<IngestReport, AppError> {
    let manifest = manifest_for(config)?;
    info!(
        files = manifest.len(),
        mode = %config.ingest_mode,
        chunk_size = config.chunk.max_records,
        "[INGEST] Resolved sources"
    );

    load_all(store, &manifest, &config.ingest_options())
}
