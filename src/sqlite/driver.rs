use std::collections::BTreeMap;
use std::fmt;

use rusqlite::{Connection as RusqliteConnection, Statement};

use super::config;
use super::params::{Bound, LongData, bind_value};
use super::query::SqliteRows;
use crate::config::ConnectOptions;
use crate::driver::{Driver, DriverRows, DriverStatement, TxFlags};
use crate::error::{CODE_DRIVER_FAILURE, CODE_INVALID_ARGUMENT, StmtMiddlewareError};
use crate::types::{RowValues, TypeTag};

/// `SQLite` link implementing the driver primitives on `rusqlite`.
pub struct SqliteDriver {
    conn: RusqliteConnection,
}

impl SqliteDriver {
    /// Wrap an existing `rusqlite` connection.
    #[must_use]
    pub fn from_rusqlite(conn: RusqliteConnection) -> Self {
        Self { conn }
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConnectionError` if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, StmtMiddlewareError> {
        let conn = RusqliteConnection::open_in_memory().map_err(|e| {
            StmtMiddlewareError::ConnectionError {
                message: format!("failed to open in-memory SQLite database: {e}"),
                code: crate::error::sqlite_code(&e),
            }
        })?;
        Ok(Self { conn })
    }

    /// Borrow the underlying `rusqlite` connection.
    #[must_use]
    pub fn raw(&self) -> &RusqliteConnection {
        &self.conn
    }

    fn run(&self, sql: &str) -> Result<(), StmtMiddlewareError> {
        self.conn.execute_batch(sql).map_err(StmtMiddlewareError::from)
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("path", &self.conn.path())
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

/// Whether `sql` is a statement that can assign a rowid.
fn assigns_rowid(sql: &str) -> bool {
    let head = sql.trim_start();
    ["INSERT", "REPLACE"].iter().any(|verb| {
        head.get(..verb.len())
            .is_some_and(|word| word.eq_ignore_ascii_case(verb))
    })
}

fn unsupported(what: &str) -> StmtMiddlewareError {
    StmtMiddlewareError::execution(
        format!("{what} is not supported by SQLite"),
        CODE_INVALID_ARGUMENT,
    )
}

fn reject_completion_flags(flags: TxFlags) -> Result<(), StmtMiddlewareError> {
    if flags.contains(TxFlags::AND_CHAIN) {
        return Err(unsupported("AND CHAIN"));
    }
    if flags.contains(TxFlags::RELEASE) {
        return Err(unsupported("RELEASE"));
    }
    Ok(())
}

impl Driver for SqliteDriver {
    type Statement<'a> = SqliteStatement<'a>;

    fn connect(opts: &ConnectOptions) -> Result<Self, StmtMiddlewareError> {
        Ok(Self {
            conn: config::open(opts)?,
        })
    }

    fn prepare<'a>(&'a mut self, sql: &str) -> Result<SqliteStatement<'a>, StmtMiddlewareError> {
        let conn: &'a RusqliteConnection = &self.conn;
        let stmt = conn.prepare(sql)?;
        Ok(SqliteStatement::new(conn, stmt, assigns_rowid(sql)))
    }

    fn begin(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        if flags.contains(TxFlags::READ_ONLY) && flags.contains(TxFlags::READ_WRITE) {
            return Err(StmtMiddlewareError::execution(
                "READ ONLY and READ WRITE are mutually exclusive",
                CODE_INVALID_ARGUMENT,
            ));
        }
        match name {
            Some(name) => self.run(&format!("SAVEPOINT {name}")),
            None if flags.contains(TxFlags::READ_WRITE) => self.run("BEGIN IMMEDIATE"),
            None => self.run("BEGIN"),
        }
    }

    fn commit(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        reject_completion_flags(flags)?;
        match name {
            Some(name) => self.run(&format!("RELEASE SAVEPOINT {name}")),
            None => self.run("COMMIT"),
        }
    }

    fn rollback(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        reject_completion_flags(flags)?;
        match name {
            Some(name) => self.run(&format!(
                "ROLLBACK TO SAVEPOINT {name}; RELEASE SAVEPOINT {name}"
            )),
            None => self.run("ROLLBACK"),
        }
    }

    fn close(self) -> Result<(), StmtMiddlewareError> {
        self.conn
            .close()
            .map_err(|(_, e)| StmtMiddlewareError::from(e))
    }

    fn insert_verb(&self, ignore_duplicates: bool) -> &'static str {
        if ignore_duplicates {
            "INSERT OR IGNORE"
        } else {
            "INSERT"
        }
    }
}

/// A prepared `SQLite` statement.
///
/// Long-data chunks are appended to a per-parameter buffer and bound as a
/// single value right before the statement is stepped.
///
/// The generated id is `last_insert_rowid()` for an `INSERT`/`REPLACE` that
/// changed at least one row, including one with a `RETURNING` clause, and 0
/// for everything else.
pub struct SqliteStatement<'conn> {
    conn: &'conn RusqliteConnection,
    stmt: Statement<'conn>,
    assigns_rowid: bool,
    bound: bool,
    long_data: BTreeMap<usize, LongData>,
    affected_rows: u64,
    insert_id: u64,
    result: Option<SqliteRows>,
}

impl<'conn> SqliteStatement<'conn> {
    fn new(conn: &'conn RusqliteConnection, stmt: Statement<'conn>, assigns_rowid: bool) -> Self {
        Self {
            conn,
            stmt,
            assigns_rowid,
            bound: false,
            long_data: BTreeMap::new(),
            affected_rows: 0,
            insert_id: 0,
            result: None,
        }
    }
}

impl SqliteStatement<'_> {
    fn generated_id(&self, changed: bool) -> u64 {
        if self.assigns_rowid && changed {
            u64::try_from(self.conn.last_insert_rowid()).unwrap_or(0)
        } else {
            0
        }
    }
}

impl DriverStatement for SqliteStatement<'_> {
    type Rows = SqliteRows;

    fn bind(&mut self, tags: &[TypeTag], params: &[RowValues]) -> Result<(), StmtMiddlewareError> {
        let expected = self.stmt.parameter_count();
        if tags.len() != params.len() || expected != params.len() {
            return Err(StmtMiddlewareError::execution(
                format!(
                    "number of bind variables doesn't match number of parameters in prepared statement (expected {expected}, got {})",
                    params.len()
                ),
                CODE_DRIVER_FAILURE,
            ));
        }

        let mut deferred = BTreeMap::new();
        for (i, (tag, value)) in tags.iter().zip(params).enumerate() {
            match bind_value(i, *tag, value)? {
                Bound::Now(v) => self.stmt.raw_bind_parameter(i + 1, v)?,
                Bound::Later(long) => {
                    deferred.insert(i, long);
                }
            }
        }
        self.long_data = deferred;
        self.bound = true;
        Ok(())
    }

    fn send_long_data(&mut self, index: usize, chunk: &[u8]) -> Result<(), StmtMiddlewareError> {
        let long = self.long_data.get_mut(&index).ok_or_else(|| {
            StmtMiddlewareError::execution(
                format!("parameter {index} was not bound as long data"),
                CODE_DRIVER_FAILURE,
            )
        })?;
        long.buf.extend_from_slice(chunk);
        Ok(())
    }

    fn execute(&mut self) -> Result<(), StmtMiddlewareError> {
        if !self.bound && self.stmt.parameter_count() > 0 {
            return Err(StmtMiddlewareError::execution(
                "no data supplied for parameters in prepared statement",
                CODE_DRIVER_FAILURE,
            ));
        }
        for (index, long) in std::mem::take(&mut self.long_data) {
            let value = long.into_value(index)?;
            self.stmt.raw_bind_parameter(index + 1, value)?;
        }

        if self.stmt.column_count() == 0 {
            let changed = self.stmt.raw_execute()?;
            self.affected_rows = changed as u64;
            self.insert_id = self.generated_id(changed > 0);
        } else {
            let rows = SqliteRows::buffer(&mut self.stmt)?;
            self.affected_rows = rows.num_rows();
            // a RETURNING insert yields one row per inserted row
            self.insert_id = self.generated_id(rows.num_rows() > 0);
            self.result = Some(rows);
        }
        Ok(())
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn insert_id(&self) -> u64 {
        self.insert_id
    }

    fn take_result(&mut self) -> Result<Option<SqliteRows>, StmtMiddlewareError> {
        Ok(self.result.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rowid_statements_are_recognized() {
        assert!(assigns_rowid("INSERT INTO t VALUES (1)"));
        assert!(assigns_rowid("  insert or ignore into t VALUES (1)"));
        assert!(assigns_rowid("REPLACE INTO t VALUES (1)"));
        assert!(!assigns_rowid("UPDATE t SET a = 1"));
        assert!(!assigns_rowid("SELECT 'INSERT'"));
        assert!(!assigns_rowid("INS"));
    }

    #[test]
    fn rowid_reuse_still_reports_generated_id() {
        let mut driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .run("CREATE TABLE a (id INTEGER PRIMARY KEY); CREATE TABLE b (id INTEGER PRIMARY KEY);")
            .unwrap();
        for table in ["a", "b"] {
            let mut stmt = driver
                .prepare(&format!("INSERT INTO {table} DEFAULT VALUES"))
                .unwrap();
            stmt.execute().unwrap();
            assert_eq!(stmt.insert_id(), 1, "{table}");
        }
    }
}
