//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::ConnectOptions;
pub use crate::connection::{BoundStatement, Connection};
pub use crate::driver::{Driver, DriverRows, DriverStatement, TxFlags};
pub use crate::error::StmtMiddlewareError;
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::session::{SessionHandler, SqlSessionStore};
pub use crate::types::{RowValues, TypeTag};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteDriver};
