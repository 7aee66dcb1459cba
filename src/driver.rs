//! The primitives a database client must provide for the executor.
//!
//! A driver owns the live link. Statements it hands out are scoped handles:
//! dropping one releases the server-side statement, and dropping a
//! [`DriverRows`] releases the result buffer.

use std::ops::{BitOr, BitOrAssign};

use crate::config::ConnectOptions;
use crate::error::StmtMiddlewareError;
use crate::types::{RowValues, TypeTag};

/// Transaction flag bitset, using the MySQL client constant values.
///
/// Begin flags and commit/rollback flags share bit positions; a flag only has
/// meaning for the call it is passed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TxFlags(u32);

impl TxFlags {
    pub const NONE: TxFlags = TxFlags(0);
    // begin
    pub const WITH_CONSISTENT_SNAPSHOT: TxFlags = TxFlags(1);
    pub const READ_WRITE: TxFlags = TxFlags(2);
    pub const READ_ONLY: TxFlags = TxFlags(4);
    // commit / rollback
    pub const AND_CHAIN: TxFlags = TxFlags(1);
    pub const AND_NO_CHAIN: TxFlags = TxFlags(2);
    pub const RELEASE: TxFlags = TxFlags(4);
    pub const NO_RELEASE: TxFlags = TxFlags(8);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        TxFlags(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: TxFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TxFlags {
    type Output = TxFlags;

    fn bitor(self, rhs: TxFlags) -> TxFlags {
        TxFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TxFlags {
    fn bitor_assign(&mut self, rhs: TxFlags) {
        self.0 |= rhs.0;
    }
}

/// A database link able to prepare statements and drive transactions.
pub trait Driver {
    type Statement<'a>: DriverStatement
    where
        Self: 'a;

    /// Open a link from validated options.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConnectionError` if the server refuses the link.
    fn connect(opts: &ConnectOptions) -> Result<Self, StmtMiddlewareError>
    where
        Self: Sized;

    /// Prepare `sql` server-side.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` with the driver diagnostic.
    fn prepare<'a>(&'a mut self, sql: &str) -> Result<Self::Statement<'a>, StmtMiddlewareError>;

    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the driver rejects the request.
    fn begin(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError>;

    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the driver rejects the request.
    fn commit(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError>;

    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the driver rejects the request.
    fn rollback(&mut self, flags: TxFlags, name: Option<&str>)
    -> Result<(), StmtMiddlewareError>;

    /// Release the link.
    ///
    /// # Errors
    /// Returns the driver's close failure; the link is gone either way.
    fn close(self) -> Result<(), StmtMiddlewareError>
    where
        Self: Sized;

    /// Verb used by `insert`.
    fn insert_verb(&self, ignore_duplicates: bool) -> &'static str {
        if ignore_duplicates {
            "INSERT IGNORE"
        } else {
            "INSERT"
        }
    }
}

/// A prepared statement handle.
pub trait DriverStatement {
    type Rows: DriverRows;

    /// Bind every parameter with its tag in one call. Values tagged
    /// [`TypeTag::Blob`] receive their payload through [`Self::send_long_data`].
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the binding is rejected.
    fn bind(&mut self, tags: &[TypeTag], params: &[RowValues]) -> Result<(), StmtMiddlewareError>;

    /// Append one chunk to the long-data parameter at `index`.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the chunk is rejected.
    fn send_long_data(&mut self, index: usize, chunk: &[u8]) -> Result<(), StmtMiddlewareError>;

    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` with the driver diagnostic.
    fn execute(&mut self) -> Result<(), StmtMiddlewareError>;

    fn affected_rows(&self) -> u64;

    /// Generated id of the executed statement, 0 when none was generated.
    fn insert_id(&self) -> u64;

    /// Take the buffered result; `None` when the statement is not a query.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the result cannot be read.
    fn take_result(&mut self) -> Result<Option<Self::Rows>, StmtMiddlewareError>;
}

/// A buffered result produced by an executed statement.
pub trait DriverRows {
    fn column_names(&self) -> &[String];

    fn num_rows(&self) -> u64;

    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the row cannot be decoded.
    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, StmtMiddlewareError>;
}
