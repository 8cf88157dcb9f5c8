//! Chunked CSV-to-SQLite ingestion and the vendor sales summary built on top
//! of the loaded tables.

pub mod commands;
pub mod config;
pub mod error;
pub mod frame;
pub mod loader;
pub mod logging;
pub mod storage;
pub mod streaming;
pub mod summary;
