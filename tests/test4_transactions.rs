#![cfg(feature = "sqlite")]

use stmt_middleware::prelude::*;

fn conn_with_table() -> Result<SqliteConnection, StmtMiddlewareError> {
    let mut conn = Connection::with_default_packet(SqliteDriver::open_in_memory()?);
    conn.exec("CREATE TABLE ledger (id INTEGER PRIMARY KEY, amount INTEGER)", &[])?;
    Ok(conn)
}

fn count(conn: &mut SqliteConnection) -> Result<i64, StmtMiddlewareError> {
    let row = conn.fetch_one("SELECT COUNT(*) AS n FROM ledger", &[])?;
    Ok(row
        .and_then(|row| row.get("n").and_then(RowValues::as_int).copied())
        .unwrap_or_default())
}

#[test]
fn commit_keeps_and_rollback_discards() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = conn_with_table()?;

    let autocommit = |conn: &SqliteConnection| conn.driver().map(|d| d.raw().is_autocommit());
    assert_eq!(autocommit(&conn), Some(true));

    conn.begin(TxFlags::READ_WRITE, None)?;
    assert_eq!(autocommit(&conn), Some(false));
    conn.insert("ledger", [("amount", RowValues::Int(10))], false)?;
    conn.commit(TxFlags::NONE, None)?;
    assert_eq!(autocommit(&conn), Some(true));
    assert_eq!(count(&mut conn)?, 1);

    conn.begin(TxFlags::NONE, None)?;
    conn.insert("ledger", [("amount", RowValues::Int(20))], false)?;
    conn.rollback(TxFlags::NONE, None)?;
    assert_eq!(count(&mut conn)?, 1);
    Ok(())
}

#[test]
fn named_transactions_nest_as_savepoints() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = conn_with_table()?;

    conn.begin(TxFlags::NONE, None)?;
    conn.insert("ledger", [("amount", RowValues::Int(1))], false)?;

    conn.begin(TxFlags::NONE, Some("inner"))?;
    conn.insert("ledger", [("amount", RowValues::Int(2))], false)?;
    conn.rollback(TxFlags::NONE, Some("inner"))?;

    conn.begin(TxFlags::NONE, Some("kept"))?;
    conn.insert("ledger", [("amount", RowValues::Int(3))], false)?;
    conn.commit(TxFlags::NONE, Some("kept"))?;

    conn.commit(TxFlags::AND_NO_CHAIN, None)?;

    let rs = conn
        .fetch_all("SELECT amount FROM ledger ORDER BY id", &[])?
        .expect("rows");
    let amounts: Vec<i64> = rs
        .results
        .iter()
        .filter_map(|row| row.get("amount").and_then(RowValues::as_int).copied())
        .collect();
    assert_eq!(amounts, vec![1, 3]);
    Ok(())
}

#[test]
fn unsupported_flags_and_states_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = conn_with_table()?;

    let err = conn
        .begin(TxFlags::READ_ONLY | TxFlags::READ_WRITE, None)
        .unwrap_err();
    assert_eq!(err.code(), -1);

    let err = conn.commit(TxFlags::NONE, None).unwrap_err();
    assert!(matches!(err, StmtMiddlewareError::ExecutionError { .. }));

    conn.begin(TxFlags::NONE, None)?;
    let err = conn.commit(TxFlags::AND_CHAIN, None).unwrap_err();
    assert_eq!(err.code(), -1);
    let err = conn.rollback(TxFlags::RELEASE, None).unwrap_err();
    assert_eq!(err.code(), -1);
    conn.rollback(TxFlags::NONE, None)?;

    let err = conn.begin(TxFlags::NONE, Some("x; DROP TABLE ledger")).unwrap_err();
    assert!(matches!(err, StmtMiddlewareError::ConfigError(_)));
    assert_eq!(count(&mut conn)?, 0);
    Ok(())
}
