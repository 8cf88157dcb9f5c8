//! Streaming utilities for processing large files.
//!
//! This module provides record-aware chunked CSV reading that preserves data
//! integrity even when fields contain embedded commas and newlines inside
//! quotes, while keeping at most one chunk in memory.

mod csv_chunker;

pub use csv_chunker::{parse_field, ChunkConfig, CsvChunks};
