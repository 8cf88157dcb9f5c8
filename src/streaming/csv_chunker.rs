//! Record-aware chunked CSV reading.
//!
//! Uses the `csv` crate to properly handle embedded commas and newlines within
//! quoted fields. Reads a CSV source sequentially and yields it as a series of
//! `Table` chunks bounded by a record count and an approximate byte size, so
//! a file of any size is loaded with bounded memory.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use rusqlite::types::Value;

use crate::error::AppError;
use crate::frame::Table;

/// Field values treated as missing, in addition to the empty string.
const NA_VALUES: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "#N/A"];

/// Configuration for chunked reading.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum approximate bytes of field data per chunk (default: 100 MB).
    pub max_bytes: u64,
    /// Maximum records per chunk (excluding header).
    pub max_records: u64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_bytes: 100 * 1024 * 1024, // 100 MB
            max_records: 100_000,
        }
    }
}

impl ChunkConfig {
    /// Creates a ChunkConfig with the given record limit.
    pub fn with_chunk_size(records: u64) -> Self {
        Self::default().max_records(records)
    }

    /// Sets the max_bytes limit.
    pub fn max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    /// Sets the max_records limit.
    pub fn max_records(mut self, records: u64) -> Self {
        self.max_records = records;
        self
    }

    /// Rejects limits that could never admit a record.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_records == 0 {
            return Err(AppError::Config("chunk size must be a positive number of rows".into()));
        }
        if self.max_bytes == 0 {
            return Err(AppError::Config("chunk byte limit must be positive".into()));
        }
        Ok(())
    }
}

/// Sequential reader yielding a CSV source as bounded `Table` chunks.
///
/// Every chunk carries the header's column names. Iteration stops after the
/// first error.
pub struct CsvChunks<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    config: ChunkConfig,
    pending: Option<StringRecord>,
    chunks_read: u64,
    rows_read: u64,
    finished: bool,
}

impl CsvChunks<BufReader<File>> {
    /// Opens a CSV file for chunked reading.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the file cannot be opened and
    /// `AppError::CsvInvalid` if it has no header row.
    pub fn open(path: &Path, config: ChunkConfig) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::Io(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file), config)
    }
}

impl<R: Read> CsvChunks<R> {
    /// Wraps any reader producing CSV text with a header row.
    pub fn from_reader(source: R, config: ChunkConfig) -> Result<Self, AppError> {
        config.validate()?;

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::CsvInvalid(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(String::from)
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(AppError::CsvInvalid("CSV file has no header row".to_string()));
        }

        Ok(Self {
            reader,
            headers,
            config,
            pending: None,
            chunks_read: 0,
            rows_read: 0,
            finished: false,
        })
    }

    /// Column names from the header row.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Reads the next chunk, or `None` once the source is exhausted.
    fn next_chunk(&mut self) -> Result<Option<Table>, AppError> {
        let mut chunk = Table::new(self.headers.iter().cloned());
        let mut chunk_bytes: u64 = 0;
        let mut chunk_rows: u64 = 0;

        loop {
            let record = match self.pending.take() {
                Some(record) => record,
                None => {
                    let mut record = StringRecord::new();
                    let more = self.reader.read_record(&mut record).map_err(|e| {
                        AppError::CsvInvalid(format!("Failed to read CSV record: {}", e))
                    })?;
                    if !more {
                        break;
                    }
                    record
                }
            };

            let record_size = record_size(&record);
            if would_exceed_limits(chunk_bytes, chunk_rows, record_size, &self.config) {
                self.pending = Some(record);
                break;
            }

            chunk.push_row(record.iter().map(parse_field).collect())?;
            chunk_bytes += record_size;
            chunk_rows += 1;
        }

        if chunk.is_empty() {
            return Ok(None);
        }

        self.rows_read += chunk_rows;

        tracing::debug!(
            chunk_index = self.chunks_read,
            rows = chunk_rows,
            bytes = chunk_bytes,
            "Read chunk"
        );
        self.chunks_read += 1;

        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for CsvChunks<R> {
    type Item = Result<Table, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Converts a raw CSV field to a typed value.
///
/// Empty and NA markers become NULL, integers become INTEGER, finite floats
/// become REAL, everything else stays TEXT.
pub fn parse_field(field: &str) -> Value {
    if field.is_empty() || NA_VALUES.contains(&field) {
        return Value::Null;
    }
    if let Ok(i) = field.parse::<i64>() {
        return Value::Integer(i);
    }
    match field.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Real(f),
        _ => Value::Text(field.to_string()),
    }
}

/// Approximate serialized size: field bytes plus one separator per field.
fn record_size(record: &StringRecord) -> u64 {
    (record.as_slice().len() + record.len()) as u64
}

/// Checks if adding a record would exceed the configured limits.
fn would_exceed_limits(
    current_bytes: u64,
    current_rows: u64,
    record_size: u64,
    config: &ChunkConfig,
) -> bool {
    // The first record of a chunk is always accepted, even when it alone
    // exceeds max_bytes.
    if current_rows == 0 {
        return false;
    }

    if current_rows >= config.max_records {
        return true;
    }

    current_bytes + record_size > config.max_bytes
}
