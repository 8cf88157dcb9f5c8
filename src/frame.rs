//! In-memory tabular buffer.
//!
//! A `Table` is an ordered list of column names plus rows of SQLite values.
//! It is the unit the loader appends (one chunk at a time) and the shape the
//! summary builder works on between the aggregation queries and write-back.

use std::fmt;

use rusqlite::types::Value;

use crate::error::AppError;

/// Rows of SQLite values under named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates a table from column names and rows, checking row widths.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, AppError> {
        let mut table = Self::new(columns);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row. The row must have exactly one value per column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), AppError> {
        if row.len() != self.columns.len() {
            return Err(AppError::Internal(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the position of a column by name.
    pub fn column_index(&self, name: &str) -> Result<usize, AppError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AppError::MissingColumn(name.to_string()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Returns the value at `row` in the named column.
    pub fn value(&self, row: usize, name: &str) -> Result<&Value, AppError> {
        let idx = self.column_index(name)?;
        self.rows
            .get(row)
            .map(|r| &r[idx])
            .ok_or_else(|| AppError::Internal(format!("Row {} out of range", row)))
    }

    /// Returns all values of the named column, in row order.
    pub fn column_values(&self, name: &str) -> Result<Vec<&Value>, AppError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Replaces the named column, or appends it when it does not exist yet.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> Result<(), AppError> {
        if values.len() != self.rows.len() {
            return Err(AppError::Internal(format!(
                "Column '{}' has {} values but table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Ok(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            Err(_) => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Applies `f` to every value of the named column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), AppError>
    where
        F: FnMut(usize, &Value) -> Result<Value, AppError>,
    {
        let idx = self.column_index(name)?;
        for (i, row) in self.rows.iter_mut().enumerate() {
            row[idx] = f(i, &row[idx])?;
        }
        Ok(())
    }

    /// Applies `f` to every value of every column in place.
    pub fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, &Value) -> Value,
    {
        for row in &mut self.rows {
            for (idx, value) in row.iter_mut().enumerate() {
                *value = f(idx, value);
            }
        }
    }

    /// Splits the table into sequential sub-tables of at most `size` rows.
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = Table> + '_ {
        self.rows.chunks(size.max(1)).map(|rows| Table {
            columns: self.columns.clone(),
            rows: rows.to_vec(),
        })
    }

    /// Returns a displayable view of the first `n` rows.
    pub fn head(&self, n: usize) -> Head<'_> {
        Head { table: self, n }
    }
}

/// Display adapter for the first rows of a table, used for log samples.
pub struct Head<'a> {
    table: &'a Table,
    n: usize,
}

impl fmt::Display for Head<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .table
            .rows
            .iter()
            .take(self.n)
            .map(|r| r.iter().map(display_value).collect())
            .collect();

        let widths: Vec<usize> = self
            .table
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                rows.iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(c.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        for (i, c) in self.table.columns.iter().enumerate() {
            write!(f, "{:>w$} ", c, w = widths[i])?;
        }
        for row in &rows {
            writeln!(f)?;
            for (i, v) in row.iter().enumerate() {
                write!(f, "{:>w$} ", v, w = widths[i])?;
            }
        }
        if self.table.len() > self.n {
            write!(f, "\n[{} rows x {} columns]", self.table.len(), self.table.columns.len())?;
        }
        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Numeric view of a value: integers and reals only.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        _ => None,
    }
}
