#![cfg(feature = "sqlite")]

use std::process::{Command, Output};

use stmt_middleware::prelude::*;

fn stmt_session(dsn: &str, args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_stmt-session"))
        .arg("--dsn")
        .arg(dsn)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
}

fn long_ago() -> i64 {
    100
}

#[test]
fn init_gc_list_over_a_session_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sessions.db");
    let dsn = format!("host=localhost;user=cli;db={}", path.display());

    let out = stmt_session(&dsn, &["init"])?;
    assert_eq!(out.status.code(), Some(0));

    {
        let mut conn = SqliteConnection::connect(&dsn.parse()?)?;
        let mut stale = SqlSessionStore::new(&mut conn).clock(long_ago);
        assert!(stale.write("stale", "old data"));
        let mut fresh = SqlSessionStore::new(&mut conn);
        assert!(fresh.write("fresh", "new data"));
        conn.close();
    }

    let out = stmt_session(&dsn, &["gc", "--max-lifetime", "1440"])?;
    assert_eq!(out.status.code(), Some(0));

    let out = stmt_session(&dsn, &["list"])?;
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8(out.stdout)?;
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["table"], "session_handler_table");
    assert_eq!(lines[0]["row"]["id"], "fresh");
    assert!(lines[0]["row"]["timestamp"].as_i64().is_some_and(|t| t > 100));

    let out = stmt_session(&dsn, &["read", "fresh"])?;
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8(out.stdout)?.trim_end(), "new data");

    let out = stmt_session(&dsn, &["read", "stale"])?;
    assert_eq!(out.status.code(), Some(1));
    Ok(())
}

#[test]
fn bad_invocations_exit_with_error_code() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sessions.db");

    let out = stmt_session("user=cli", &["init"])?;
    assert_eq!(out.status.code(), Some(2));

    let dsn = format!("host=localhost;user=cli;db={}", path.display());
    let out = stmt_session(&dsn, &["--table", "bad name", "init"])?;
    assert_eq!(out.status.code(), Some(2));

    // no table yet, so listing fails
    let out = stmt_session(&dsn, &["list"])?;
    assert_eq!(out.status.code(), Some(2));
    Ok(())
}
