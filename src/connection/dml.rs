use super::Connection;
use crate::driver::Driver;
use crate::error::StmtMiddlewareError;
use crate::query_utils::{ensure_identifier, placeholders};
use crate::types::RowValues;

impl<D: Driver> Connection<D> {
    /// Execute a statement for its effect and return rows affected.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError` if the statement fails.
    pub fn exec(&mut self, sql: &str, params: &[RowValues]) -> Result<u64, StmtMiddlewareError> {
        let stmt = self.execute(sql, params)?;
        let affected = stmt.affected_rows();
        stmt.close();
        Ok(affected)
    }

    /// Insert one row and return the generated id (0 when none was generated).
    ///
    /// `columns` is read exactly once, so each name stays paired with its value:
    /// ```rust,no_run
    /// # use stmt_middleware::prelude::*;
    /// # fn demo(conn: &mut SqliteConnection) -> Result<(), StmtMiddlewareError> {
    /// let id = conn.insert(
    ///     "users",
    ///     [("name", RowValues::from("ada")), ("age", RowValues::Int(36))],
    ///     false,
    /// )?;
    /// # let _ = id;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ConfigError` for an empty column list or a
    /// non-identifier table/column name, otherwise any execution failure.
    pub fn insert<I, K>(
        &mut self,
        table: &str,
        columns: I,
        ignore_duplicates: bool,
    ) -> Result<u64, StmtMiddlewareError>
    where
        I: IntoIterator<Item = (K, RowValues)>,
        K: Into<String>,
    {
        ensure_identifier("table", table)?;
        let (names, values): (Vec<String>, Vec<RowValues>) = columns
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .unzip();
        if names.is_empty() {
            return Err(StmtMiddlewareError::ConfigError(
                "insert needs at least one column".into(),
            ));
        }
        for name in &names {
            ensure_identifier("column", name)?;
        }

        let verb = self.link_mut()?.insert_verb(ignore_duplicates);
        let sql = format!(
            "{verb} INTO {table} ({}) VALUES ({})",
            names.join(","),
            placeholders(values.len())
        );
        let stmt = self.execute(&sql, &values)?;
        let insert_id = stmt.insert_id();
        stmt.close();
        Ok(insert_id)
    }
}
