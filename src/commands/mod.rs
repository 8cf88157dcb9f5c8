//! Entry-point commands behind the binaries.

mod ingest;
mod summary;

pub use ingest::{ingest, manifest_for};
pub use summary::vendor_summary;

use crate::error::AppError;

/// Prints an error's presentation to stderr.
pub fn report_error(error: &AppError) {
    let presentation = error.to_presentation();
    eprintln!("{}: {}", presentation.title, presentation.message);
    if let Some(action) = presentation.action {
        eprintln!("  -> {}", action);
    }
}
