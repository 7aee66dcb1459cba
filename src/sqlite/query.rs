use std::collections::VecDeque;

use rusqlite::Statement;
use rusqlite::types::Value;

use super::params::sqlite_value_to_row_value;
use crate::driver::DriverRows;
use crate::error::StmtMiddlewareError;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `StmtMiddlewareError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, StmtMiddlewareError> {
    let value: Value = row.get(idx)?;
    Ok(sqlite_value_to_row_value(value))
}

/// Rows buffered client-side after a query statement ran.
#[derive(Debug, Default)]
pub struct SqliteRows {
    column_names: Vec<String>,
    rows: VecDeque<Vec<RowValues>>,
    total: u64,
}

impl SqliteRows {
    /// Step a bound query statement to completion, buffering every row.
    pub(crate) fn buffer(stmt: &mut Statement<'_>) -> Result<Self, StmtMiddlewareError> {
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let col_count = column_names.len();

        let mut buffered = VecDeque::new();
        let mut rows_iter = stmt.raw_query();
        while let Some(row) = rows_iter.next()? {
            let mut row_values = Vec::with_capacity(col_count);
            for i in 0..col_count {
                row_values.push(sqlite_extract_value_sync(row, i)?);
            }
            buffered.push_back(row_values);
        }

        Ok(Self {
            column_names,
            total: buffered.len() as u64,
            rows: buffered,
        })
    }
}

impl DriverRows for SqliteRows {
    fn column_names(&self) -> &[String] {
        &self.column_names
    }

    fn num_rows(&self) -> u64 {
        self.total
    }

    fn next_row(&mut self) -> Result<Option<Vec<RowValues>>, StmtMiddlewareError> {
        Ok(self.rows.pop_front())
    }
}
