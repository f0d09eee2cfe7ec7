pub mod migrations;
pub mod queries;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use rusqlite::{Connection, ErrorCode};

/// Store operations wait this long on a locked database before failing as retryable.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    init_db_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
}

pub fn init_db_with_timeout(path: &str, busy_timeout: Duration) -> anyhow::Result<Connection> {
    let mut conn = Connection::open(path).context("failed to open database")?;

    conn.busy_timeout(busy_timeout)
        .context("failed to set busy timeout")?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&mut conn, &migrations_dir())?;

    let created = queries::ensure_settings(&conn).context("failed to seed admin settings")?;
    if created {
        tracing::info!("created default admin settings");
    }

    Ok(conn)
}

fn migrations_dir() -> PathBuf {
    let local = PathBuf::from(migrations::MIGRATIONS_DIR);
    if local.exists() {
        local
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(migrations::MIGRATIONS_DIR)
    }
}

fn sqlite_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain()
        .find_map(|e| e.downcast_ref::<rusqlite::Error>())
        .and_then(|e| e.sqlite_error_code())
}

/// True when a write was refused by a UNIQUE constraint or unique index.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|e| e.downcast_ref::<rusqlite::Error>())
        .map(|e| match e {
            rusqlite::Error::SqliteFailure(f, _) => {
                f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        })
        .unwrap_or(false)
}

pub fn is_transient(err: &anyhow::Error) -> bool {
    matches!(
        sqlite_code(err),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}
