//! # kiln-db
//!
//! Persistent local repository for the Kiln toolchain. One embedded SQLite
//! database holds compiled contract artifacts, deployment records, cached
//! ABI definitions, address aliases, and name-auction bids, shared across
//! tool invocations.
//!
//! ## Layout
//!
//! - Content-addressed artifact store: `code` and `compilations`
//! - Per-chain deployment ledger: `deployments`
//! - ABI cache, alias registry, auction bids: `abi_cache`, `aliases`, `bids`
//! - Repository metadata and settings: `metadata`
//!
//! The schema version lives in the `metadata` table under `SchemaVersion`.
//! [`open`] runs [`migrations::ensure_schema`] before handing out the
//! connection, so no query function is reachable against an unmigrated
//! store. WAL mode and foreign keys are mandatory.

pub mod migrations;
pub mod queries;
pub mod schema;
pub mod snapshot;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use snapshot::{NoSnapshot, Snapshotter, VacuumSnapshotter};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 4;

/// Stored as `SchemaVersion` while a migration chain is running. Never a
/// valid version; observing it at open time means a migration crashed and
/// the store must be restored from the pre-migration snapshot.
pub const VERSION_MIGRATION_IN_PROGRESS: i64 = -1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("integrity fault: {0}")]
    Integrity(String),

    #[error("snapshot failed: {0}")]
    Snapshot(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the repository database at the given path.
///
/// Configures WAL mode and foreign keys, then brings the schema to the
/// current version. An older store is migrated in place after a
/// [`VacuumSnapshotter`] snapshot; a newer store is refused.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    let snapshotter = VacuumSnapshotter::for_database(path, &conn)?;
    migrations::ensure_schema(&conn, &snapshotter)?;
    Ok(conn)
}

/// Open with a caller-supplied snapshotter (custom backup layouts, tests).
pub fn open_with(path: &Path, snapshotter: &dyn Snapshotter) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::ensure_schema(&conn, snapshotter)?;
    Ok(conn)
}

/// Open an in-memory repository (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::ensure_schema(&conn, &NoSnapshot)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Default database path: `$KILN_DATA_DIR/kiln.db`, or the platform data
/// directory.
pub fn default_db_path() -> PathBuf {
    default_data_dir().join("kiln.db")
}

/// Platform-specific default data directory, overridable via `KILN_DATA_DIR`.
fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KILN_DATA_DIR") {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "macos")]
    {
        home_fallback("Library/Application Support/Kiln")
    }
    #[cfg(not(target_os = "macos"))]
    {
        home_fallback(".kiln")
    }
}

fn home_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/kiln"))
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count == 1)
}
