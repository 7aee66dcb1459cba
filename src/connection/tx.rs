use tracing::debug;

use super::Connection;
use crate::driver::{Driver, TxFlags};
use crate::error::StmtMiddlewareError;
use crate::query_utils::ensure_identifier;

fn check_name(name: Option<&str>) -> Result<Option<&str>, StmtMiddlewareError> {
    match name {
        Some("") | None => Ok(None),
        Some(name) => {
            ensure_identifier("transaction name", name)?;
            Ok(Some(name))
        }
    }
}

impl<D: Driver> Connection<D> {
    /// Begin a transaction; a name opens a savepoint-style transaction where supported.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` for an invalid name and
    /// `ExecutionError` if the driver rejects the request.
    pub fn begin(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        let name = check_name(name)?;
        debug!(flags = flags.bits(), name = ?name, "begin");
        self.link_mut()?.begin(flags, name)
    }

    /// Commit the current (or named) transaction.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` for an invalid name and
    /// `ExecutionError` if the driver rejects the request.
    pub fn commit(&mut self, flags: TxFlags, name: Option<&str>) -> Result<(), StmtMiddlewareError> {
        let name = check_name(name)?;
        debug!(flags = flags.bits(), name = ?name, "commit");
        self.link_mut()?.commit(flags, name)
    }

    /// Roll back the current (or named) transaction.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` for an invalid name and
    /// `ExecutionError` if the driver rejects the request.
    pub fn rollback(
        &mut self,
        flags: TxFlags,
        name: Option<&str>,
    ) -> Result<(), StmtMiddlewareError> {
        let name = check_name(name)?;
        debug!(flags = flags.bits(), name = ?name, "rollback");
        self.link_mut()?.rollback(flags, name)
    }
}
