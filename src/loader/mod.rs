//! Bulk loader: streams tabular sources into store tables in bounded chunks.

mod bulk;
mod manifest;

pub use bulk::{append_chunks, load_table, LoadOptions, LoadReport, Source, WriteMode};
pub use manifest::{load_all, load_dir, IngestReport, Manifest, ManifestEntry};
