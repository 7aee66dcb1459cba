use std::sync::Arc;

use super::Connection;
use crate::driver::{Driver, DriverRows};
use crate::error::StmtMiddlewareError;
use crate::results::{CustomDbRow, ResultSet};
use crate::types::RowValues;

/// Drain a driver result into a [`ResultSet`], keeping server order.
///
/// # Errors
/// Returns `StmtMiddlewareError::ExecutionError` if a row cannot be decoded.
pub fn build_result_set<R: DriverRows>(rows: &mut R) -> Result<ResultSet, StmtMiddlewareError> {
    let capacity = usize::try_from(rows.num_rows()).unwrap_or(0);
    let mut result_set = ResultSet::with_capacity(capacity);
    result_set.set_column_names(Arc::new(rows.column_names().to_vec()));

    while let Some(row_values) = rows.next_row()? {
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

impl<D: Driver> Connection<D> {
    /// Run a query and return every row.
    ///
    /// Returns `Ok(None)` when the statement produced no result set at all
    /// (it was not a query), and an empty set when the query matched nothing.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError` if execution or row decoding fails.
    pub fn fetch_all(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<ResultSet>, StmtMiddlewareError> {
        let mut stmt = self.execute(sql, params)?;
        let Some(mut rows) = stmt.take_result()? else {
            return Ok(None);
        };
        let result_set = build_result_set(&mut rows)?;
        drop(rows);
        stmt.close();
        Ok(Some(result_set))
    }

    /// Run a query and return its first row, or `None` when there is none.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError` if execution or row decoding fails.
    pub fn fetch_one(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, StmtMiddlewareError> {
        let mut stmt = self.execute(sql, params)?;
        let Some(mut rows) = stmt.take_result()? else {
            return Ok(None);
        };
        let first = match rows.next_row()? {
            Some(values) => Some(CustomDbRow::new(
                Arc::new(rows.column_names().to_vec()),
                values,
            )),
            None => None,
        };
        drop(rows);
        stmt.close();
        Ok(first)
    }
}
