#![cfg(feature = "sqlite")]

use stmt_middleware::prelude::*;
use stmt_middleware::session::DEFAULT_SESSION_TABLE;

fn at_100() -> i64 {
    100
}

fn at_200() -> i64 {
    200
}

fn at_260() -> i64 {
    260
}

fn memory_conn(max_allowed_packet: usize) -> Result<SqliteConnection, StmtMiddlewareError> {
    let opts = ConnectOptions::new("localhost", "sessions")
        .database(":memory:")
        .max_allowed_packet(max_allowed_packet);
    SqliteConnection::connect(&opts)
}

#[test]
fn write_then_read_is_byte_exact() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = memory_conn(32)?;
    let mut store = SqlSessionStore::new(&mut conn);
    assert_eq!(store.table(), DEFAULT_SESSION_TABLE);
    store.create_table()?;

    assert!(store.open("/var/lib/sessions", "SESSID"));
    let small = "user|s:3:\"bob\";";
    let large = format!("{}{}", "payload:ü;".repeat(50), "end");
    assert!(store.write("abc", small));
    assert!(store.write("big", &large));

    assert_eq!(store.read("abc").as_deref(), Some(small));
    assert_eq!(store.read("big"), Some(large));
    assert_eq!(store.read("missing"), None);

    assert!(store.write("abc", "replaced"));
    assert_eq!(store.read("abc").as_deref(), Some("replaced"));
    assert!(store.close());
    Ok(())
}

#[test]
fn destroy_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = memory_conn(1024)?;
    let mut store = SqlSessionStore::new(&mut conn);
    store.create_table()?;

    assert!(store.write("gone", "x"));
    assert!(store.destroy("gone"));
    assert_eq!(store.read("gone"), None);
    assert!(store.destroy("gone"));
    assert!(store.destroy("never-existed"));
    Ok(())
}

#[test]
fn gc_removes_sessions_older_than_cutoff() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = memory_conn(1024)?;
    {
        let mut store = SqlSessionStore::new(&mut conn).clock(at_100);
        store.create_table()?;
        assert!(store.write("old", "a"));
    }
    {
        let mut store = SqlSessionStore::new(&mut conn).clock(at_200);
        assert!(store.write("new", "b"));
        assert!(store.gc(0));
        assert_eq!(store.read("old"), None);
        assert_eq!(store.read("new").as_deref(), Some("b"));

        let listed = store.list()?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed.results[0].get("timestamp"), Some(&RowValues::Int(200)));
    }
    {
        let mut store = SqlSessionStore::new(&mut conn).clock(at_260);
        assert!(store.gc(100));
        assert_eq!(store.read("new").as_deref(), Some("b"));
        assert!(store.gc(50));
        assert_eq!(store.read("new"), None);
        assert!(store.list()?.is_empty());
    }
    Ok(())
}

#[test]
fn custom_table_names_are_validated() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = memory_conn(1024)?;
    let err = SqlSessionStore::with_table(&mut conn, "sessions; DROP TABLE users").unwrap_err();
    assert!(matches!(err, StmtMiddlewareError::ConfigError(_)));

    let mut store = SqlSessionStore::with_table(&mut conn, "web_sessions")?.clock(at_100);
    store.create_table()?;
    assert!(store.write("k", "v"));
    drop(store);

    let row = conn
        .fetch_one("SELECT id, data, timestamp FROM web_sessions", &[])?
        .expect("stored session");
    assert_eq!(row.get("id"), Some(&RowValues::Text("k".into())));
    assert_eq!(row.get("timestamp"), Some(&RowValues::Int(100)));
    Ok(())
}

#[test]
fn backend_failures_become_false_or_none() -> Result<(), Box<dyn std::error::Error>> {
    let mut conn = memory_conn(1024)?;
    let mut store = SqlSessionStore::new(&mut conn);

    assert!(!store.write("id", "data"));
    assert_eq!(store.read("id"), None);
    assert!(!store.destroy("id"));
    assert!(!store.gc(10));
    assert!(store.list().is_err());
    Ok(())
}
