//! Session persistence on top of a [`Connection`].
//!
//! Expected table layout:
//!
//! ```sql
//! CREATE TABLE session_handler_table (
//!     id        VARCHAR(128) NOT NULL,
//!     data      MEDIUMTEXT NOT NULL,
//!     timestamp BIGINT UNSIGNED NOT NULL,
//!     PRIMARY KEY (id)
//! );
//! ```

use tracing::warn;

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::StmtMiddlewareError;
use crate::query_utils::ensure_identifier;
use crate::results::ResultSet;
use crate::types::RowValues;

pub const DEFAULT_SESSION_TABLE: &str = "session_handler_table";

/// Source of "now" in epoch seconds.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The storage contract a session subsystem drives.
///
/// Implementations report failure through the return value and never panic or
/// propagate errors.
pub trait SessionHandler {
    fn open(&mut self, save_path: &str, name: &str) -> bool;

    fn close(&mut self) -> bool;

    /// Stored data for `id`, or `None` if absent or unreadable.
    fn read(&mut self, id: &str) -> Option<String>;

    fn write(&mut self, id: &str, data: &str) -> bool;

    fn destroy(&mut self, id: &str) -> bool;

    /// Remove sessions older than `max_lifetime` seconds.
    fn gc(&mut self, max_lifetime: i64) -> bool;
}

/// [`SessionHandler`] storing sessions in a SQL table.
#[derive(Debug)]
pub struct SqlSessionStore<'c, D: Driver> {
    conn: &'c mut Connection<D>,
    table: String,
    clock: Clock,
}

impl<'c, D: Driver> SqlSessionStore<'c, D> {
    /// Store sessions in [`DEFAULT_SESSION_TABLE`].
    pub fn new(conn: &'c mut Connection<D>) -> Self {
        Self {
            conn,
            table: DEFAULT_SESSION_TABLE.to_owned(),
            clock: system_clock,
        }
    }

    /// Store sessions in `table`.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` if `table` is not a plain identifier.
    pub fn with_table(
        conn: &'c mut Connection<D>,
        table: impl Into<String>,
    ) -> Result<Self, StmtMiddlewareError> {
        let table = table.into();
        ensure_identifier("table_name", &table)?;
        Ok(Self {
            conn,
            table,
            clock: system_clock,
        })
    }

    /// Replace the clock used for write timestamps and gc cutoffs.
    #[must_use]
    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the backing table if it does not exist yet.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError` if the DDL fails.
    pub fn create_table(&mut self) -> Result<(), StmtMiddlewareError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             id VARCHAR(128) NOT NULL, \
             data MEDIUMTEXT NOT NULL, \
             timestamp BIGINT UNSIGNED NOT NULL, \
             PRIMARY KEY (id))",
            self.table
        );
        self.conn.exec(&sql, &[])?;
        Ok(())
    }

    /// Every session's id and timestamp, oldest first.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError` if the query fails.
    pub fn list(&mut self) -> Result<ResultSet, StmtMiddlewareError> {
        let sql = format!(
            "SELECT id, timestamp FROM {} ORDER BY timestamp, id",
            self.table
        );
        Ok(self.conn.fetch_all(&sql, &[])?.unwrap_or_default())
    }

    fn try_read(&mut self, id: &str) -> Result<Option<String>, StmtMiddlewareError> {
        let sql = format!("SELECT data FROM {} WHERE id=?", self.table);
        let row = self.conn.fetch_one(&sql, &[RowValues::from(id)])?;
        Ok(row.and_then(|row| match row.get("data") {
            Some(RowValues::Text(data)) => Some(data.clone()),
            Some(RowValues::Blob(bytes)) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }))
    }

    fn try_write(&mut self, id: &str, data: &str) -> Result<u64, StmtMiddlewareError> {
        let sql = format!("REPLACE INTO {} VALUES (?,?,?)", self.table);
        self.conn.exec(
            &sql,
            &[
                RowValues::from(id),
                RowValues::from(data),
                RowValues::Int((self.clock)()),
            ],
        )
    }

    fn try_destroy(&mut self, id: &str) -> Result<u64, StmtMiddlewareError> {
        let sql = format!("DELETE FROM {} WHERE id=?", self.table);
        self.conn.exec(&sql, &[RowValues::from(id)])
    }

    fn try_gc(&mut self, max_lifetime: i64) -> Result<u64, StmtMiddlewareError> {
        let cutoff = (self.clock)().saturating_sub(max_lifetime);
        let sql = format!("DELETE FROM {} WHERE timestamp < ?", self.table);
        self.conn.exec(&sql, &[RowValues::Int(cutoff)])
    }
}

impl<D: Driver> SessionHandler for SqlSessionStore<'_, D> {
    fn open(&mut self, _save_path: &str, _name: &str) -> bool {
        true
    }

    fn close(&mut self) -> bool {
        true
    }

    fn read(&mut self, id: &str) -> Option<String> {
        self.try_read(id)
            .inspect_err(|e| warn!(table = %self.table, error = %e, "session read failed"))
            .ok()
            .flatten()
    }

    fn write(&mut self, id: &str, data: &str) -> bool {
        match self.try_write(id, data) {
            Ok(affected) => affected > 0,
            Err(e) => {
                warn!(table = %self.table, error = %e, "session write failed");
                false
            }
        }
    }

    fn destroy(&mut self, id: &str) -> bool {
        match self.try_destroy(id) {
            Ok(_) => true,
            Err(e) => {
                warn!(table = %self.table, error = %e, "session destroy failed");
                false
            }
        }
    }

    fn gc(&mut self, max_lifetime: i64) -> bool {
        match self.try_gc(max_lifetime) {
            Ok(removed) => {
                tracing::debug!(table = %self.table, removed, "session gc");
                true
            }
            Err(e) => {
                warn!(table = %self.table, error = %e, "session gc failed");
                false
            }
        }
    }
}
