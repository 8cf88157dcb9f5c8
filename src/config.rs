//! Runtime configuration from the environment (and an optional `.env`).

use std::env;
use std::path::PathBuf;

use crate::error::AppError;
use crate::loader::{LoadOptions, WriteMode};
use crate::streaming::ChunkConfig;

/// Settings shared by the ingestion and summary commands.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory scanned for `*.csv` files when no manifest is given.
    pub data_dir: PathBuf,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory holding the per-command log files.
    pub log_dir: PathBuf,
    /// Chunk limits for every load, including the summary write-back.
    pub chunk: ChunkConfig,
    pub ingest_mode: WriteMode,
    pub summary_mode: WriteMode,
    /// Optional JSON manifest replacing the directory scan.
    pub manifest_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_path: PathBuf::from("inventory.db"),
            log_dir: PathBuf::from("logs"),
            chunk: ChunkConfig::default(),
            ingest_mode: WriteMode::Append,
            summary_mode: WriteMode::Append,
            manifest_path: None,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from a key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(size) = lookup("CHUNK_SIZE") {
            config.chunk.max_records = parse_positive("CHUNK_SIZE", &size)?;
        }
        if let Some(bytes) = lookup("CHUNK_MAX_BYTES") {
            config.chunk.max_bytes = parse_positive("CHUNK_MAX_BYTES", &bytes)?;
        }
        if let Some(mode) = lookup("INGEST_WRITE_MODE") {
            config.ingest_mode = mode.parse()?;
        }
        if let Some(mode) = lookup("SUMMARY_WRITE_MODE") {
            config.summary_mode = mode.parse()?;
        }
        config.manifest_path = lookup("MANIFEST_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    pub fn ingest_options(&self) -> LoadOptions {
        LoadOptions::new(self.chunk.clone(), self.ingest_mode)
    }

    pub fn summary_options(&self) -> LoadOptions {
        LoadOptions::new(self.chunk.clone(), self.summary_mode)
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, AppError> {
    match raw.trim().replace('_', "").parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
    }
}
