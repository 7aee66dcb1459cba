//! Blocking prepared-statement execution over a pluggable database driver.
//!
//! Parameters are classified into bind types once per call; text or binary
//! values at or above the connection's `max_allowed_packet` are streamed to
//! the driver in chunks instead of being bound inline. Results are
//! materialized into [`ResultSet`]s of [`CustomDbRow`]s, and the
//! [`session`] module persists request sessions through the same executor.

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod results;
pub mod session;
pub mod types;

mod query_utils;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use config::ConnectOptions;
pub use connection::{BoundStatement, Connection};
pub use driver::{Driver, DriverRows, DriverStatement, TxFlags};
pub use error::StmtMiddlewareError;
pub use results::{CustomDbRow, ResultSet};
pub use session::{SessionHandler, SqlSessionStore};
pub use types::{RowValues, TypeTag};
