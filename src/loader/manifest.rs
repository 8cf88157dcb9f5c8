//! Explicit list of files to ingest and the tables they load into.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::bulk::{load_table, LoadOptions, LoadReport, Source};
use crate::error::AppError;
use crate::storage::Store;

/// One source file and its destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source: PathBuf,
    pub table_name: String,
}

/// Ordered set of files to load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds an entry at the end.
    pub fn push(&mut self, source: impl Into<PathBuf>, table_name: impl Into<String>) {
        self.entries.push(ManifestEntry {
            source: source.into(),
            table_name: table_name.into(),
        });
    }

    /// Builds a manifest from every `.csv` file directly inside `dir`.
    ///
    /// The table name is the file name without its extension. Entries are
    /// sorted by file name.
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let read_dir = fs::read_dir(dir).map_err(|e| {
            AppError::Io(format!("Failed to read directory {}: {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|e| AppError::Io(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            let is_csv = path.is_file() && path.extension().is_some_and(|ext| ext == "csv");
            if is_csv {
                paths.push(path);
            }
        }
        paths.sort();

        let mut manifest = Manifest::default();
        for path in paths {
            let table_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    AppError::Config(format!("File name is not valid UTF-8: {}", path.display()))
                })?
                .to_string();
            manifest.push(path, table_name);
        }

        Ok(manifest)
    }

    /// Reads a JSON manifest: an array of `{ "source": ..., "table_name": ... }`.
    ///
    /// Relative sources are resolved against the manifest file's directory.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|e| {
            AppError::Io(format!("Failed to read manifest {}: {}", path.display(), e))
        })?;

        let mut manifest: Manifest = serde_json::from_str(&text).map_err(|e| {
            AppError::Config(format!("Invalid manifest {}: {}", path.display(), e))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for entry in &mut manifest.entries {
            if entry.table_name.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Manifest entry for {} has an empty table_name",
                    entry.source.display()
                )));
            }
            if entry.source.is_relative() {
                entry.source = base.join(&entry.source);
            }
        }

        Ok(manifest)
    }
}

/// Outcome of a full ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub tables: Vec<LoadReport>,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Loads every manifest entry, in order, stopping at the first failure.
pub fn load_all(
    store: &mut Store,
    manifest: &Manifest,
    options: &LoadOptions,
) -> Result<IngestReport, AppError> {
    let start = Instant::now();
    info!("Starting data ingestion");

    let mut tables = Vec::with_capacity(manifest.len());
    for entry in manifest.entries() {
        let file_name = entry
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.source.display().to_string());
        info!("Ingesting {} into database", file_name);

        let report = load_table(store, Source::Csv(&entry.source), &entry.table_name, options)?;
        tables.push(report);
    }

    let elapsed = start.elapsed();
    info!("---------------- ingestion complete ----------------");
    info!("Total time taken: {:.2} minutes", elapsed.as_secs_f64() / 60.0);

    Ok(IngestReport { tables, elapsed })
}

/// Loads every CSV file in `dir` into a table named after the file.
pub fn load_dir(store: &mut Store, dir: &Path, options: &LoadOptions) -> Result<IngestReport, AppError> {
    let manifest = Manifest::from_dir(dir)?;
    load_all(store, &manifest, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::WriteMode;
    use crate::logging::capture::CapturedLogs;
    use crate::streaming::ChunkConfig;
    use tempfile::TempDir;

    fn options() -> LoadOptions {
        LoadOptions::new(ChunkConfig::with_chunk_size(2), WriteMode::Append)
    }

    #[test]
    fn from_dir_picks_csv_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sales.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("purchases.csv"), "a\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let manifest = Manifest::from_dir(dir.path()).unwrap();
        let names: Vec<&str> = manifest.entries().iter().map(|e| e.table_name.as_str()).collect();

        assert_eq!(names, vec!["purchases", "sales"]);
    }

    #[test]
    fn from_dir_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Manifest::from_dir(&dir.path().join("data")),
            Err(AppError::Io(_))
        ));
    }

    #[test]
    fn json_manifest_resolves_relative_sources() {
        let dir = TempDir::new().unwrap();
        let manifest_path = dir.path().join("manifest.json");
        fs::write(
            &manifest_path,
            r#"[{"source": "raw/invoices.csv", "table_name": "vendor_invoice"}]"#,
        )
        .unwrap();

        let manifest = Manifest::from_json_file(&manifest_path).unwrap();

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.entries()[0].table_name, "vendor_invoice");
        assert_eq!(manifest.entries()[0].source, dir.path().join("raw/invoices.csv"));
    }

    #[test]
    fn json_manifest_rejects_bad_shape() {
        let dir = TempDir::new().unwrap();
        let manifest_path = dir.path().join("manifest.json");
        fs::write(&manifest_path, r#"{"source": "x.csv"}"#).unwrap();

        assert!(matches!(
            Manifest::from_json_file(&manifest_path),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn load_dir_creates_one_table_per_file_and_logs_progress() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("sales.csv"), "VendorNo,Brand\n1,58\n2,60\n3,61\n").unwrap();
        fs::write(dir.path().join("vendor_invoice.csv"), "VendorNumber,Freight\n1,10.5\n").unwrap();
        let mut store = Store::open_in_memory().unwrap();

        let logs = CapturedLogs::default();
        let report = logs
            .capture(|| load_dir(&mut store, dir.path(), &options()))
            .unwrap();

        assert_eq!(report.tables.len(), 2);
        assert_eq!(report.total_rows(), 4);
        assert_eq!(store.row_count("sales").unwrap(), 3);
        assert_eq!(store.row_count("vendor_invoice").unwrap(), 1);

        let text = logs.contents();
        assert!(text.contains("Ingesting sales.csv into database"));
        assert!(text.contains("ingestion complete"));
        assert!(text.contains("Total time taken:"));
    }

    #[test]
    fn load_all_follows_manifest_table_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SalesFINAL12312016.csv");
        fs::write(&path, "VendorNo,Brand\n1,58\n").unwrap();

        let mut manifest = Manifest::default();
        manifest.push(&path, "sales");
        let mut store = Store::open_in_memory().unwrap();

        load_all(&mut store, &manifest, &options()).unwrap();

        assert!(store.table_exists("sales").unwrap());
        assert!(!store.table_exists("SalesFINAL12312016").unwrap());
    }
}
