//! `SQLite` backend built on `rusqlite`.
//!
//! `ConnectOptions::database` names the database file; an empty name or
//! `:memory:` opens an in-memory database.

mod config;
mod driver;
mod params;
mod query;

pub use driver::{SqliteDriver, SqliteStatement};
pub use params::sqlite_value_to_row_value;
pub use query::{SqliteRows, sqlite_extract_value_sync};

/// A [`crate::Connection`] backed by `SQLite`.
pub type SqliteConnection = crate::Connection<SqliteDriver>;
