//! Vendor/brand aggregations over the base tables and the merge that joins
//! them into one row per purchase group.

use tracing::{debug, info};

use crate::error::AppError;
use crate::frame::Table;
use crate::storage::Store;

/// Freight cost per vendor from `vendor_invoice`.
const FREIGHT_SQL: &str = r#"
SELECT
    VendorNumber,
    SUM(Freight) AS FreightCost
FROM vendor_invoice
GROUP BY VendorNumber
ORDER BY VendorNumber
"#;

/// Purchase totals per vendor, brand, description and price point.
///
/// Records with a non-positive purchase price are excluded. Each distinct
/// reference price/volume from `purchase_prices` yields its own row.
const PURCHASE_SQL: &str = r#"
SELECT
    p.VendorNumber,
    p.VendorName,
    p.Brand,
    p.Description,
    p.PurchasePrice,
    pp.Price AS ActualPrice,
    pp.Volume,
    SUM(p.Quantity) AS TotalPurchaseQuantity,
    SUM(p.Dollars) AS TotalPurchaseDollars
FROM purchases p
JOIN purchase_prices pp
    ON p.Brand = pp.Brand
    AND p.VendorNumber = pp.VendorNumber
WHERE p.PurchasePrice > 0
GROUP BY
    p.VendorNumber,
    p.VendorName,
    p.Brand,
    p.Description,
    p.PurchasePrice,
    pp.Price,
    pp.Volume
ORDER BY
    p.VendorNumber,
    p.Brand,
    p.VendorName,
    p.Description,
    p.PurchasePrice,
    pp.Price,
    pp.Volume
"#;

/// Sales totals per vendor and brand from `sales`.
const SALES_SQL: &str = r#"
SELECT
    VendorNo,
    Brand,
    SUM(SalesQuantity) AS TotalSalesQuantity,
    SUM(SalesDollars) AS TotalSalesDollars,
    SUM(SalesPrice) AS TotalSalesPrice,
    SUM(ExciseTax) AS TotalExciseTax
FROM sales
GROUP BY VendorNo, Brand
ORDER BY VendorNo, Brand
"#;

/// Left join of the three aggregates, one row per purchase group.
///
/// Keys compare under SQLite's affinity rules, so a numeric brand in
/// `purchases` matches the same brand stored as text in `sales`. Ties in
/// purchase dollars keep purchase grouping order.
const MERGE_SELECT: &str = r#"
SELECT
    ps.VendorNumber,
    ps.VendorName,
    ps.Brand,
    ps.Description,
    ps.PurchasePrice,
    ps.ActualPrice,
    ps.Volume,
    ps.TotalPurchaseQuantity,
    ps.TotalPurchaseDollars,
    ss.TotalSalesQuantity,
    ss.TotalSalesDollars,
    ss.TotalSalesPrice,
    ss.TotalExciseTax,
    fs.FreightCost
FROM PurchaseSummary ps
LEFT JOIN SalesSummary ss
    ON ps.VendorNumber = ss.VendorNo
    AND ps.Brand = ss.Brand
LEFT JOIN FreightSummary fs
    ON ps.VendorNumber = fs.VendorNumber
ORDER BY
    ps.TotalPurchaseDollars DESC,
    ps.VendorNumber,
    ps.Brand,
    ps.VendorName,
    ps.Description,
    ps.PurchasePrice,
    ps.ActualPrice,
    ps.Volume
"#;

/// Column the merged summary is ordered by, largest first.
pub const ORDER_COLUMN: &str = "TotalPurchaseDollars";

pub fn freight_by_vendor(store: &Store) -> Result<Table, AppError> {
    let table = store.query(FREIGHT_SQL)?;
    debug!(rows = table.len(), "Aggregated freight by vendor");
    Ok(table)
}

pub fn purchases_by_vendor_brand(store: &Store) -> Result<Table, AppError> {
    let table = store.query(PURCHASE_SQL)?;
    debug!(rows = table.len(), "Aggregated purchases by vendor and brand");
    Ok(table)
}

pub fn sales_by_vendor_brand(store: &Store) -> Result<Table, AppError> {
    let table = store.query(SALES_SQL)?;
    debug!(rows = table.len(), "Aggregated sales by vendor and brand");
    Ok(table)
}

fn merge_sql() -> String {
    format!(
        "WITH\nFreightSummary AS ({freight}),\nPurchaseSummary AS ({purchases}),\nSalesSummary AS ({sales})\n{select}",
        freight = FREIGHT_SQL,
        purchases = PURCHASE_SQL,
        sales = SALES_SQL,
        select = MERGE_SELECT,
    )
}

/// Left-joins the purchase aggregate with the sales aggregate (on vendor and
/// brand) and the freight aggregate (on vendor), largest purchase dollars
/// first.
///
/// Every purchase row is kept; columns from an unmatched side are NULL.
pub fn merge(store: &Store) -> Result<Table, AppError> {
    store.query(&merge_sql())
}

/// Runs the three aggregations and their merge against the base tables.
pub fn build_summary(store: &Store) -> Result<Table, AppError> {
    let summary = merge(store)?;

    info!(
        rows = summary.len(),
        columns = summary.columns().len(),
        "[SUMMARY] Built vendor summary"
    );

    Ok(summary)
}
