use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use tracing::debug;

use crate::config::ConnectOptions;
use crate::error::{StmtMiddlewareError, sqlite_code};
use crate::query_utils::{ensure_identifier, is_pragma_value};

fn refused(err: &rusqlite::Error, db_path: &str) -> StmtMiddlewareError {
    StmtMiddlewareError::ConnectionError {
        message: format!("failed to open SQLite database {db_path:?}: {err}"),
        code: sqlite_code(err),
    }
}

/// Open the `SQLite` database named by `opts.database`.
///
/// An empty database or `:memory:` opens an in-memory database. Non-zero
/// `flags` are passed as `OpenFlags` bits. Every option is applied as
/// `PRAGMA key = value`.
///
/// # Errors
/// Returns `StmtMiddlewareError::ConnectionError` if the database cannot be opened or an
/// option is rejected.
pub(crate) fn open(opts: &ConnectOptions) -> Result<RusqliteConnection, StmtMiddlewareError> {
    let flags = if opts.flags == 0 {
        OpenFlags::default()
    } else {
        OpenFlags::from_bits_truncate(opts.flags)
    };

    let db_path = opts.database.as_str();
    let conn = if db_path.is_empty() || db_path == ":memory:" {
        RusqliteConnection::open_in_memory_with_flags(flags)
    } else {
        RusqliteConnection::open_with_flags(db_path, flags)
    }
    .map_err(|e| refused(&e, db_path))?;

    for (key, value) in &opts.options {
        apply_pragma(&conn, key, value)?;
    }

    debug!(db_path, host = %opts.host, user = %opts.user, "sqlite link open");
    Ok(conn)
}

fn apply_pragma(
    conn: &RusqliteConnection,
    key: &str,
    value: &str,
) -> Result<(), StmtMiddlewareError> {
    let invalid = |message: String| StmtMiddlewareError::invalid_connect_param(message);
    ensure_identifier("option name", key).map_err(|e| invalid(e.message().to_owned()))?;
    if !is_pragma_value(value) {
        return Err(invalid(format!("option {key} has unsupported value {value:?}")));
    }
    conn.execute_batch(&format!("PRAGMA {key} = {value};"))
        .map_err(|e| StmtMiddlewareError::ConnectionError {
            message: format!("option {key} rejected: {e}"),
            code: sqlite_code(&e),
        })
}
