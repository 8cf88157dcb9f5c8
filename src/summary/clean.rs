//! Cleaning of the merged summary and derived-metric computation.

use rusqlite::types::Value;

use crate::error::AppError;
use crate::frame::{as_f64, Table};

/// Text attributes whose surrounding whitespace is removed.
const TRIMMED_COLUMNS: [&str; 2] = ["VendorName", "Description"];

/// Column coerced to floating point.
const VOLUME_COLUMN: &str = "Volume";

/// Cleans the merged summary and appends the derived columns.
///
/// Steps, in order: `Volume` to REAL, NULL to zero, whitespace trim of the
/// vendor name and description, then `GrossProfit`, `ProfitMargin`,
/// `StockTurnover` and `SalesToPurchaseRatio`.
///
/// Divisions follow IEEE-754: a zero denominator yields an infinity, or NaN
/// when the numerator is zero as well. Derived columns already present are
/// recomputed in place.
///
/// # Errors
///
/// - `AppError::TypeConversion` for a non-numeric `Volume` or aggregate value
/// - `AppError::MissingColumn` when an input column is absent
pub fn clean(mut table: Table) -> Result<Table, AppError> {
    coerce_volume(&mut table)?;
    fill_nulls(&mut table);
    for column in TRIMMED_COLUMNS {
        trim_text(&mut table, column)?;
    }
    add_derived_columns(&mut table)?;
    Ok(table)
}

fn coerce_volume(table: &mut Table) -> Result<(), AppError> {
    table.map_column(VOLUME_COLUMN, |row, value| match value {
        Value::Null => Ok(Value::Null),
        Value::Integer(i) => Ok(Value::Real(*i as f64)),
        Value::Real(r) => Ok(Value::Real(*r)),
        Value::Text(s) => s.trim().parse::<f64>().map(Value::Real).map_err(|_| {
            AppError::TypeConversion {
                column: VOLUME_COLUMN.to_string(),
                row,
                value: s.clone(),
            }
        }),
        Value::Blob(b) => Err(AppError::TypeConversion {
            column: VOLUME_COLUMN.to_string(),
            row,
            value: format!("<{} bytes>", b.len()),
        }),
    })
}

/// Replaces NULL with zero.
///
/// A numeric column holding NULLs becomes REAL throughout: the NULLs turn
/// into `0.0` and its integers into reals. NULLs in other columns become
/// `0`. Columns without NULLs are left as they are.
fn fill_nulls(table: &mut Table) {
    let promote: Vec<bool> = (0..table.columns().len())
        .map(|idx| {
            let mut values = table.rows().iter().map(|r| &r[idx]);
            let has_null = values.clone().any(|v| matches!(v, Value::Null));
            has_null && values.all(|v| matches!(v, Value::Null | Value::Integer(_) | Value::Real(_)))
        })
        .collect();

    table.map_values(|idx, value| match value {
        Value::Null if promote[idx] => Value::Real(0.0),
        Value::Null => Value::Integer(0),
        Value::Integer(i) if promote[idx] => Value::Real(*i as f64),
        other => other.clone(),
    });
}

fn trim_text(table: &mut Table, column: &str) -> Result<(), AppError> {
    table.map_column(column, |_, value| {
        Ok(match value {
            Value::Text(s) => Value::Text(s.trim().to_string()),
            other => other.clone(),
        })
    })
}

fn add_derived_columns(table: &mut Table) -> Result<(), AppError> {
    let sales_dollars = numeric_column(table, "TotalSalesDollars")?;
    let purchase_dollars = numeric_column(table, "TotalPurchaseDollars")?;
    let sales_quantity = numeric_column(table, "TotalSalesQuantity")?;
    let purchase_quantity = numeric_column(table, "TotalPurchaseQuantity")?;

    let gross_profit: Vec<f64> = sales_dollars
        .iter()
        .zip(&purchase_dollars)
        .map(|(sales, purchases)| sales - purchases)
        .collect();
    let profit_margin: Vec<f64> = gross_profit
        .iter()
        .zip(&sales_dollars)
        .map(|(profit, sales)| profit / sales * 100.0)
        .collect();
    let stock_turnover: Vec<f64> = sales_quantity
        .iter()
        .zip(&purchase_quantity)
        .map(|(sold, bought)| sold / bought)
        .collect();
    let sales_to_purchase: Vec<f64> = sales_dollars
        .iter()
        .zip(&purchase_dollars)
        .map(|(sales, purchases)| sales / purchases)
        .collect();

    table.set_column("GrossProfit", reals(gross_profit))?;
    table.set_column("ProfitMargin", reals(profit_margin))?;
    table.set_column("StockTurnover", reals(stock_turnover))?;
    table.set_column("SalesToPurchaseRatio", reals(sales_to_purchase))?;
    Ok(())
}

fn reals(values: Vec<f64>) -> Vec<Value> {
    values.into_iter().map(Value::Real).collect()
}

/// Reads a column as floats. Runs after the NULL fill, so NULL is an error
/// like any other non-numeric value.
fn numeric_column(table: &Table, column: &str) -> Result<Vec<f64>, AppError> {
    table
        .column_values(column)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            as_f64(value).ok_or_else(|| AppError::TypeConversion {
                column: column.to_string(),
                row,
                value: format!("{:?}", value),
            })
        })
        .collect()
}
