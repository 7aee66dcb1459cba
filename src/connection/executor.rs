use tracing::debug;

use super::Connection;
use crate::driver::{Driver, DriverStatement};
use crate::error::{CODE_INVALID_ARGUMENT, StmtMiddlewareError};
use crate::types::{RowValues, TypeTag, chunk_count, classify_params, tag_signature};

type RowsOf<'c, D> = <<D as Driver>::Statement<'c> as DriverStatement>::Rows;

/// An executed statement borrowed from its [`Connection`].
///
/// Dropping it (or calling [`BoundStatement::close`]) releases the
/// server-side statement.
pub struct BoundStatement<'c, D: Driver + 'c> {
    stmt: D::Statement<'c>,
}

impl<'c, D: Driver + 'c> BoundStatement<'c, D> {
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.stmt.affected_rows()
    }

    #[must_use]
    pub fn insert_id(&self) -> u64 {
        self.stmt.insert_id()
    }

    /// Take the statement's result; `None` if it was not a query.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if the driver cannot produce the result.
    pub fn take_result(&mut self) -> Result<Option<RowsOf<'c, D>>, StmtMiddlewareError> {
        self.stmt.take_result()
    }

    /// Release the statement now.
    pub fn close(self) {
        drop(self.stmt);
    }
}

impl<D: Driver> Connection<D> {
    /// Prepare, bind, stream long data, and execute `sql`.
    ///
    /// On success the connection's last-call metadata is overwritten with the
    /// statement's affected-row count and generated id. Nothing is retried.
    ///
    /// # Errors
    /// Returns `StmtMiddlewareError::ExecutionError` if preparing, classifying, binding,
    /// sending long data, or executing fails, and `ConnectionError` if the connection is closed.
    pub fn execute(
        &mut self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<BoundStatement<'_, D>, StmtMiddlewareError> {
        let max_allowed_packet = self.max_allowed_packet;
        let link = self.link.as_mut().ok_or_else(StmtMiddlewareError::closed)?;

        debug!(sql, params = params.len(), "prepare");
        let mut stmt = link.prepare(sql)?;

        if !params.is_empty() {
            let tags = classify_params(params, max_allowed_packet)?;
            debug!(signature = %tag_signature(&tags), "bind");
            stmt.bind(&tags, params)?;
            send_long_data(&mut stmt, &tags, params, max_allowed_packet)?;
        }

        stmt.execute()?;

        let affected = stmt.affected_rows();
        let insert_id = stmt.insert_id();
        debug!(affected, insert_id, "executed");
        self.last_affected_rows = Some(affected);
        self.last_insert_id = Some(insert_id);

        Ok(BoundStatement { stmt })
    }
}

fn send_long_data<S: DriverStatement>(
    stmt: &mut S,
    tags: &[TypeTag],
    params: &[RowValues],
    max_allowed_packet: usize,
) -> Result<(), StmtMiddlewareError> {
    for (index, (tag, value)) in tags.iter().zip(params).enumerate() {
        if !tag.is_long_data() {
            continue;
        }
        let payload = value.as_bytes().ok_or_else(|| {
            StmtMiddlewareError::execution(
                format!("long data parameter {index} is neither text nor binary"),
                CODE_INVALID_ARGUMENT,
            )
        })?;
        for chunk in payload.chunks(max_allowed_packet) {
            stmt.send_long_data(index, chunk)?;
        }
        debug!(
            index,
            bytes = payload.len(),
            chunks = chunk_count(payload.len(), max_allowed_packet),
            "long data sent"
        );
    }
    Ok(())
}
