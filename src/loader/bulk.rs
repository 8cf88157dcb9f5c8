//! Chunked append of a tabular source into a store table.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;
use crate::frame::Table;
use crate::storage::{SqlType, Store};
use crate::streaming::{ChunkConfig, CsvChunks};

/// What happens to an existing table before a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Keep existing rows and add the new ones after them.
    #[default]
    Append,
    /// Drop the table first so it holds exactly the loaded rows.
    Replace,
}

impl FromStr for WriteMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(WriteMode::Append),
            "replace" => Ok(WriteMode::Replace),
            other => Err(AppError::Config(format!(
                "unknown write mode '{other}', expected 'append' or 'replace'"
            ))),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriteMode::Append => "append",
            WriteMode::Replace => "replace",
        })
    }
}

/// Chunking limits and write mode for one load.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub chunk: ChunkConfig,
    pub mode: WriteMode,
}

impl LoadOptions {
    pub fn new(chunk: ChunkConfig, mode: WriteMode) -> Self {
        Self { chunk, mode }
    }
}

/// Where the rows of a load come from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// A CSV file with a header row, read in chunks.
    Csv(&'a Path),
    /// An in-memory table, split into chunks of at most `max_records` rows.
    Frame(&'a Table),
}

/// Outcome of loading one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table_name: String,
    pub rows: u64,
    pub chunks: u64,
}

/// Appends every row of `source` to `table_name`, one chunk at a time.
///
/// The table is created from the first chunk's columns and inferred types
/// when it does not exist. Each chunk is committed on its own; a failure
/// part-way leaves the earlier chunks in place.
///
/// # Errors
///
/// - `AppError::SchemaMismatch` if a chunk has a column the existing table lacks
/// - `AppError::CsvInvalid` / `AppError::Io` for unreadable CSV sources
/// - `AppError::Connection` / `AppError::Database` for store failures
pub fn load_table(
    store: &mut Store,
    source: Source<'_>,
    table_name: &str,
    options: &LoadOptions,
) -> Result<LoadReport, AppError> {
    options.chunk.validate()?;

    let report = match source {
        Source::Csv(path) => {
            // Open errors and a missing header surface before anything is dropped
            let chunks = CsvChunks::open(path, options.chunk.clone())?;
            clear_for_replace(store, table_name, options.mode)?;
            append_chunks(store, chunks, table_name)?
        }
        Source::Frame(table) => {
            clear_for_replace(store, table_name, options.mode)?;
            let size = usize::try_from(options.chunk.max_records).unwrap_or(usize::MAX);
            append_chunks(store, table.chunks(size).map(Ok), table_name)?
        }
    };

    info!(
        table = table_name,
        rows = report.rows,
        chunks = report.chunks,
        "[LOAD] Loaded table"
    );

    Ok(report)
}

fn clear_for_replace(store: &mut Store, table_name: &str, mode: WriteMode) -> Result<(), AppError> {
    if mode == WriteMode::Replace {
        debug!(table = table_name, "Dropping table before load");
        store.drop_table(table_name)?;
    }
    Ok(())
}

/// Appends a sequence of chunks, creating the table on the first one.
pub fn append_chunks<I>(store: &mut Store, chunks: I, table_name: &str) -> Result<LoadReport, AppError>
where
    I: IntoIterator<Item = Result<Table, AppError>>,
{
    let mut table_columns: Option<Vec<String>> = if store.table_exists(table_name)? {
        Some(store.table_columns(table_name)?)
    } else {
        None
    };

    let mut report = LoadReport {
        table_name: table_name.to_string(),
        rows: 0,
        chunks: 0,
    };

    for chunk in chunks {
        let chunk = chunk?;
        if chunk.is_empty() {
            continue;
        }

        match &table_columns {
            Some(existing) => check_schema(table_name, existing, &chunk)?,
            None => {
                create_from_chunk(store, table_name, &chunk)?;
                table_columns = Some(chunk.columns().to_vec());
            }
        }

        let inserted = store.insert_rows(table_name, &chunk)?;
        report.rows += inserted as u64;
        report.chunks += 1;

        debug!(
            table = table_name,
            chunk_index = report.chunks - 1,
            rows = inserted,
            total_rows = report.rows,
            "Appended chunk"
        );
    }

    Ok(report)
}

/// Every chunk column must already exist in the table. Table columns the
/// chunk does not carry are left NULL.
fn check_schema(table_name: &str, existing: &[String], chunk: &Table) -> Result<(), AppError> {
    match chunk.columns().iter().find(|c| !existing.contains(c)) {
        Some(column) => Err(AppError::SchemaMismatch {
            table: table_name.to_string(),
            column: column.clone(),
        }),
        None => Ok(()),
    }
}

fn create_from_chunk(store: &mut Store, table_name: &str, chunk: &Table) -> Result<(), AppError> {
    let columns = chunk
        .columns()
        .iter()
        .map(|name| {
            let values = chunk.column_values(name)?;
            Ok((name.clone(), SqlType::infer(values)))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    store.create_table(table_name, &columns)
}
