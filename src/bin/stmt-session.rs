use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use stmt_middleware::prelude::*;
use stmt_middleware::session::DEFAULT_SESSION_TABLE;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Maintain a SQLite-backed session table")]
struct Args {
    /// Connection string, e.g. "host=localhost;user=app;db=/var/lib/app/sessions.db"
    #[arg(long)]
    dsn: String,
    #[arg(long, default_value = DEFAULT_SESSION_TABLE)]
    table: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the session table if it is missing.
    Init,
    /// Delete sessions older than the given lifetime.
    Gc {
        #[arg(long, default_value_t = 1440)]
        max_lifetime: i64,
    },
    /// Print the stored data for a session.
    Read { id: String },
    /// Delete one session.
    Destroy { id: String },
    /// Print every session id and timestamp as JSON lines.
    List,
}

#[derive(Serialize)]
struct Listed<'a> {
    table: &'a str,
    row: &'a CustomDbRow,
}

fn run(args: Args) -> Result<bool, StmtMiddlewareError> {
    let opts: ConnectOptions = args.dsn.parse()?;
    let mut conn = SqliteConnection::connect(&opts)?;
    let mut store = SqlSessionStore::with_table(&mut conn, args.table)?;

    let ok = match args.command {
        Command::Init => {
            store.create_table()?;
            true
        }
        Command::Gc { max_lifetime } => store.gc(max_lifetime),
        Command::Read { id } => match store.read(&id) {
            Some(data) => {
                println!("{data}");
                true
            }
            None => false,
        },
        Command::Destroy { id } => store.destroy(&id),
        Command::List => {
            let rows = store.list()?;
            for row in &rows.results {
                let line = serde_json::to_string(&Listed {
                    table: store.table(),
                    row,
                })
                .map_err(|e| StmtMiddlewareError::ConfigError(e.to_string()))?;
                println!("{line}");
            }
            true
        }
    };
    info!(ok, "done");
    conn.close();
    Ok(ok)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "stmt-session failed");
            ExitCode::from(2)
        }
    }
}
