//! Storage module for the local SQLite database.

mod database;

pub use database::{quote_identifier, SqlType, Store};
