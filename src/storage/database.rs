//! SQLite store handle.
//!
//! Wraps a single `rusqlite::Connection`. The handle is created once by each
//! command and passed explicitly to every load and summary operation; tests
//! use in-memory stores.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension};

use crate::error::AppError;
use crate::frame::Table;

/// Declared column type used when a table is created from a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

impl SqlType {
    /// Infers the declared type of a column from its values.
    ///
    /// INTEGER when every non-null value is an integer, REAL when every
    /// non-null value is numeric, TEXT otherwise. A column with no non-null
    /// values is REAL.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred: Option<SqlType> = None;
        for value in values {
            let kind = match value {
                Value::Null => continue,
                Value::Integer(_) => SqlType::Integer,
                Value::Real(_) => SqlType::Real,
                Value::Text(_) | Value::Blob(_) => return SqlType::Text,
            };
            inferred = Some(match (inferred, kind) {
                (Some(SqlType::Real), _) | (_, SqlType::Real) => SqlType::Real,
                _ => kind,
            });
        }
        inferred.unwrap_or(SqlType::Real)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Quotes a table or column name as an SQL identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite database handle.
#[derive(Debug)]
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Opens (or creates) the database file at the given path.
    /// Creates parent directories if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let conn = Connection::open(&path)
            .map_err(|e| AppError::Connection(format!("Failed to open database: {e}")))?;

        configure_connection(&conn)?;

        tracing::debug!(path = %path.display(), "Opened store");

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Connection(format!("Failed to open in-memory database: {e}")))?;
        Ok(Self { conn, path: None })
    }

    /// Returns the database file path, or `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the underlying connection for ad-hoc statements.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns true if a table with this name exists.
    pub fn table_exists(&self, table: &str) -> Result<bool, AppError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| AppError::Database(format!("Failed to look up table {table}: {e}")))?;
        Ok(found.is_some())
    }

    /// Returns the column names of an existing table, in declaration order.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>, AppError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))
            .map_err(|e| AppError::Database(format!("Failed to prepare table_info: {e}")))?;

        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| AppError::Database(format!("Failed to query table_info: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to collect columns: {e}")))?;

        Ok(columns)
    }

    /// Creates a table with the given columns and declared types.
    pub fn create_table(&mut self, table: &str, columns: &[(String, SqlType)]) -> Result<(), AppError> {
        let defs = columns
            .iter()
            .map(|(name, ty)| format!("{} {}", quote_identifier(name), ty))
            .collect::<Vec<_>>()
            .join(", ");

        self.conn
            .execute_batch(&format!("CREATE TABLE {} ({})", quote_identifier(table), defs))
            .map_err(|e| classify(e, &format!("Failed to create table {table}")))?;

        tracing::debug!(table, columns = columns.len(), "Created table");
        Ok(())
    }

    /// Drops a table if it exists.
    pub fn drop_table(&mut self, table: &str) -> Result<(), AppError> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_identifier(table)))
            .map_err(|e| classify(e, &format!("Failed to drop table {table}")))?;
        Ok(())
    }

    /// Inserts every row of `chunk` into `table` in one transaction.
    /// Columns are matched by name.
    pub fn insert_rows(&mut self, table: &str, chunk: &Table) -> Result<usize, AppError> {
        if chunk.is_empty() {
            return Ok(0);
        }

        let columns = chunk
            .columns()
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=chunk.columns().len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns,
            placeholders
        );

        let tx = self
            .conn
            .transaction()
            .map_err(|e| classify(e, "Failed to start insert transaction"))?;

        {
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|e| classify(e, &format!("Failed to prepare insert into {table}")))?;

            for row in chunk.rows() {
                stmt.execute(rusqlite::params_from_iter(row.iter()))
                    .map_err(|e| classify(e, &format!("Failed to insert into {table}")))?;
            }
        }

        tx.commit()
            .map_err(|e| classify(e, &format!("Failed to commit insert into {table}")))?;

        Ok(chunk.len())
    }

    /// Counts the rows of a table.
    pub fn row_count(&self, table: &str) -> Result<u64, AppError> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
                [],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Database(format!("Failed to count rows of {table}: {e}")))?;
        Ok(count as u64)
    }

    /// Runs a query and collects the full result as a table.
    pub fn query(&self, sql: &str) -> Result<Table, AppError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| AppError::Database(format!("Failed to prepare query: {e}")))?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| AppError::Database(format!("Failed to run query: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to collect rows: {e}")))?;

        Table::from_rows(columns, rows)
    }
}

/// Configures a file-backed connection: busy timeout and WAL journaling.
fn configure_connection(conn: &Connection) -> Result<(), AppError> {
    conn.busy_timeout(Duration::from_secs(10))
        .map_err(|e| AppError::Connection(format!("Failed to set busy timeout: {e}")))?;

    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| AppError::Connection(format!("Failed to set WAL mode: {e}")))?;

    Ok(())
}

/// Maps a write failure to `Connection` when the store itself is unusable,
/// and to `Database` otherwise.
fn classify(e: rusqlite::Error, context: &str) -> AppError {
    let unusable = matches!(
        e.sqlite_error_code(),
        Some(
            ErrorCode::ReadOnly
                | ErrorCode::CannotOpen
                | ErrorCode::DiskFull
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
        )
    );
    if unusable {
        AppError::Connection(format!("{context}: {e}"))
    } else {
        AppError::Database(format!("{context}: {e}"))
    }
}
