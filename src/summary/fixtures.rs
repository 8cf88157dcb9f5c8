//! Base-table fixtures shared by the summary tests.

use std::io::Cursor;

use crate::loader::append_chunks;
use crate::storage::{SqlType, Store};
use crate::streaming::{ChunkConfig, CsvChunks};

const PURCHASES_HEADER: &str = "VendorNumber,VendorName,Brand,Description,PurchasePrice,Quantity,Dollars";
const PURCHASE_PRICES_HEADER: &str = "VendorNumber,Brand,Price,Volume";
const SALES_HEADER: &str = "VendorNo,Brand,SalesQuantity,SalesDollars,SalesPrice,ExciseTax";
const VENDOR_INVOICE_HEADER: &str = "VendorNumber,Freight";

/// CSV rows (without headers) for each base table.
pub struct FixtureData {
    pub purchases: Vec<&'static str>,
    pub purchase_prices: Vec<&'static str>,
    pub sales: Vec<&'static str>,
    pub vendor_invoice: Vec<&'static str>,
}

impl FixtureData {
    /// Two purchase groups: vendor 1 brand A with no sales (purchase
    /// dollars 100, freight 10) and vendor 2 brand B with sales. Vendor 3
    /// only has a zero-priced purchase.
    pub fn standard() -> Self {
        Self {
            purchases: vec![
                "1,ALPHA SPIRITS  ,A,  Vodka 750mL ,10.0,4,40.0",
                "1,ALPHA SPIRITS  ,A,  Vodka 750mL ,10.0,6,60.0",
                "2,BETA WINES,B,Merlot,20.0,10,200.0",
                "3,GAMMA IMPORTS,C,Gin,0,5,0",
            ],
            purchase_prices: vec!["1,A,15.0,750", "2,B,25.0,750", "3,C,9.0,750"],
            sales: vec!["2,B,4,100.0,25.0,1.0", "2,B,2,50.0,25.0,0.5"],
            vendor_invoice: vec!["1,4.0", "1,6.0", "2,7.5"],
        }
    }
}

/// Loads the fixture into a fresh in-memory store through the chunked loader.
pub fn load_fixture(data: &FixtureData) -> Store {
    let mut store = Store::open_in_memory().expect("in-memory store");
    load(&mut store, "purchases", PURCHASES_HEADER, &data.purchases);
    load(&mut store, "purchase_prices", PURCHASE_PRICES_HEADER, &data.purchase_prices);
    load(&mut store, "sales", SALES_HEADER, &data.sales);
    load(&mut store, "vendor_invoice", VENDOR_INVOICE_HEADER, &data.vendor_invoice);
    store
}

fn load(store: &mut Store, table: &str, header: &str, rows: &[&str]) {
    if rows.is_empty() {
        // A header-only source creates no table, so create it directly.
        let columns: Vec<(String, SqlType)> =
            header.split(',').map(|c| (c.to_string(), SqlType::Text)).collect();
        store.create_table(table, &columns).expect("create empty table");
        return;
    }

    let mut content = String::from(header);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    content.push('\n');

    let chunks = CsvChunks::from_reader(Cursor::new(content), ChunkConfig::with_chunk_size(2))
        .expect("fixture CSV");
    append_chunks(store, chunks, table).expect("load fixture");
}
