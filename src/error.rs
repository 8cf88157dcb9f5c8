use serde::Serialize;
use thiserror::Error;

/// Operator-facing error presentation printed by the command binaries.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Load ──────────────────────────────────────────────────────────────────
    #[error("Column '{column}' does not exist in table '{table}'")]
    SchemaMismatch { table: String, column: String },

    #[error("Invalid CSV: {0}")]
    CsvInvalid(String),

    // ── Summary ───────────────────────────────────────────────────────────────
    #[error("Column '{column}' row {row}: cannot convert {value:?} to a number")]
    TypeConversion {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    // ── Store ─────────────────────────────────────────────────────────────────
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),

    // ── Environment ───────────────────────────────────────────────────────────
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a presentation suitable for the terminal.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            // ── Load ──────────────────────────────────────────────────────────
            AppError::SchemaMismatch { table, column } => ErrorPresentation {
                title: "Schema Mismatch".into(),
                message: format!(
                    "The source has column '{}' which table '{}' does not have. Rows loaded before this chunk were kept.",
                    column, table
                ),
                action: Some(format!(
                    "Drop table '{}' or set INGEST_WRITE_MODE=replace and load again",
                    table
                )),
            },

            AppError::CsvInvalid(msg) => ErrorPresentation {
                title: "Invalid CSV".into(),
                message: format!("The CSV file has a formatting problem: {}", msg),
                action: Some("Fix the CSV file and load again".into()),
            },

            // ── Summary ───────────────────────────────────────────────────────
            AppError::TypeConversion { column, row, value } => ErrorPresentation {
                title: "Non-numeric Value".into(),
                message: format!(
                    "Column '{}' holds '{}' at row {}, which is not a number.",
                    column, value, row
                ),
                action: Some("Correct the source data and rebuild the summary".into()),
            },

            AppError::MissingColumn(name) => ErrorPresentation {
                title: "Missing Column".into(),
                message: format!("Expected column '{}' was not found.", name),
                action: Some("Check that all source tables were loaded".into()),
            },

            // ── Store ─────────────────────────────────────────────────────────
            AppError::Connection(msg) => ErrorPresentation {
                title: "Database Unavailable".into(),
                message: format!("Could not open or write the database: {}", msg),
                action: Some("Check DATABASE_PATH and file permissions".into()),
            },

            AppError::Database(msg) => ErrorPresentation {
                title: "Database Error".into(),
                message: msg.clone(),
                action: None,
            },

            // ── Environment ───────────────────────────────────────────────────
            AppError::Io(msg) => ErrorPresentation {
                title: "File Error".into(),
                message: msg.clone(),
                action: Some("Check that the path exists and is readable".into()),
            },

            AppError::Config(msg) => ErrorPresentation {
                title: "Invalid Configuration".into(),
                message: msg.clone(),
                action: Some("Fix the environment or .env file".into()),
            },

            // ── Generic ───────────────────────────────────────────────────────
            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. See the log file for details.".into(),
                action: None,
            },
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns all AppError variants for exhaustive testing.
    fn all_variants() -> Vec<AppError> {
        vec![
            AppError::SchemaMismatch {
                table: "sales".into(),
                column: "Extra".into(),
            },
            AppError::CsvInvalid("missing header".into()),
            AppError::TypeConversion {
                column: "Volume".into(),
                row: 3,
                value: "Unknown".into(),
            },
            AppError::MissingColumn("Volume".into()),
            AppError::Connection("unable to open database file".into()),
            AppError::Database("no such table: sales".into()),
            AppError::Io("not found".into()),
            AppError::Config("CHUNK_SIZE must be positive".into()),
            AppError::Internal("something broke".into()),
        ]
    }

    #[test]
    fn all_variants_have_nonempty_title_and_message() {
        for variant in all_variants() {
            let presentation = variant.to_presentation();
            assert!(
                !presentation.title.trim().is_empty(),
                "Empty title for {:?}",
                variant
            );
            assert!(
                !presentation.message.trim().is_empty(),
                "Empty message for {:?}",
                variant
            );
        }
    }

    #[test]
    fn schema_mismatch_names_table_and_column() {
        let err = AppError::SchemaMismatch {
            table: "purchases".into(),
            column: "Colour".into(),
        };
        let text = err.to_string();
        assert!(text.contains("purchases"));
        assert!(text.contains("Colour"));

        let action = err.to_presentation().action.expect("should have action");
        assert!(action.contains("purchases"));
    }

    #[test]
    fn type_conversion_reports_offending_value() {
        let presentation = AppError::TypeConversion {
            column: "Volume".into(),
            row: 7,
            value: "Unknown".into(),
        }
        .to_presentation();

        assert!(presentation.message.contains("Unknown"));
        assert!(presentation.message.contains("Volume"));
        assert!(presentation.message.contains('7'));
    }

    #[test]
    fn rusqlite_errors_map_to_database() {
        let err: AppError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn serialization_produces_valid_json_with_required_fields() {
        for variant in all_variants() {
            let json = serde_json::to_string(&variant.to_presentation())
                .unwrap_or_else(|_| panic!("Failed to serialize {:?}", variant));

            let parsed: serde_json::Value = serde_json::from_str(&json)
                .unwrap_or_else(|_| panic!("Failed to parse JSON for {:?}", variant));

            assert!(parsed.get("title").is_some());
            assert!(parsed.get("message").is_some());
            assert!(parsed.get("action").is_some());
        }
    }
}
