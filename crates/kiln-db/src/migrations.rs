//! Schema versioning and the forward-only migration chain.
//!
//! The stored version lives in the `metadata` table under `SchemaVersion`.
//! [`ensure_schema`] runs once at open: a fresh store gets the current
//! tables, an older store is walked forward one version at a time, a newer
//! store is refused with the tool version that last wrote it. While the
//! chain runs, the stored version is [`VERSION_MIGRATION_IN_PROGRESS`];
//! seeing that sentinel at open means an earlier run died mid-chain and the
//! store must be restored from its pre-migration snapshot.
//!
//! Each step rebuilds affected tables by rename-copy-drop: stage the old
//! table under a `_migrate` suffix, create the canonical shape, copy rows
//! with backfill defaults, drop the staged table. No step removes a table
//! that existed in an earlier version.

use rusqlite::{Connection, OptionalExtension};

use crate::schema::{self, KEY_LAST_TOOL_VERSION, KEY_SCHEMA_VERSION};
use crate::snapshot::Snapshotter;
use crate::{DbError, Result, SCHEMA_VERSION, VERSION_MIGRATION_IN_PROGRESS};

/// Tool version recorded alongside every successful schema write.
const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bring the store to the current schema version. Idempotent.
pub fn ensure_schema(conn: &Connection, snapshotter: &dyn Snapshotter) -> Result<()> {
    match stored_version(conn)? {
        None => init_fresh(conn),
        Some(VERSION_MIGRATION_IN_PROGRESS) => Err(DbError::Integrity(
            "a schema migration was interrupted and the store is inconsistent; \
             restore the pre-migration snapshot"
                .into(),
        )),
        Some(v) if v < 0 => Err(DbError::Integrity(format!(
            "stored schema version {v} is corrupt; restore from a snapshot"
        ))),
        Some(v) if v == SCHEMA_VERSION => record_tool_version(conn),
        Some(v) if v > SCHEMA_VERSION => Err(DbError::Configuration(format!(
            "repository schema version {v} is newer than the supported {SCHEMA_VERSION}; \
             last written by tool version {}; upgrade this tool",
            written_by(conn)?
        ))),
        Some(v) => migrate(conn, snapshotter, v),
    }
}

/// Read the stored schema version. `None` means a fresh store.
pub fn stored_version(conn: &Connection) -> Result<Option<i64>> {
    if !crate::table_exists(conn, "metadata")? {
        return Ok(None);
    }
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [KEY_SCHEMA_VERSION],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        None => Err(DbError::Integrity(
            "metadata table exists but carries no schema version; \
             restore from a snapshot"
                .into(),
        )),
        Some(text) => text.parse::<i64>().map(Some).map_err(|_| {
            DbError::Integrity(format!(
                "stored schema version '{text}' is not an integer; restore from a snapshot"
            ))
        }),
    }
}

/// Create all current-version tables and record the version.
fn init_fresh(conn: &Connection) -> Result<()> {
    tracing::info!(version = SCHEMA_VERSION, "initializing fresh repository schema");
    let tx = conn.unchecked_transaction()?;
    for sql in schema::CURRENT_TABLES {
        tx.execute_batch(sql)?;
    }
    set_version(&tx, SCHEMA_VERSION)?;
    set_metadata(&tx, KEY_LAST_TOOL_VERSION, TOOL_VERSION)?;
    tx.commit()?;
    Ok(())
}

/// Walk the chain from `from` to the current version.
///
/// Snapshot first, then mark the store in progress, then one transaction
/// per step. The true version is only written back after the whole chain
/// has committed; a crash in between leaves the sentinel for the next open
/// to find.
fn migrate(conn: &Connection, snapshotter: &dyn Snapshotter, from: i64) -> Result<()> {
    tracing::info!(from, to = SCHEMA_VERSION, "schema migration required");
    snapshotter.snapshot(conn, from)?;
    set_version(conn, VERSION_MIGRATION_IN_PROGRESS)?;
    for version in from..SCHEMA_VERSION {
        step(conn, version)?;
    }
    set_version(conn, SCHEMA_VERSION)?;
    record_tool_version(conn)?;
    Ok(())
}

/// Apply the single step migrating `from` to `from + 1` in its own
/// transaction.
pub(crate) fn step(conn: &Connection, from: i64) -> Result<()> {
    tracing::info!(from, to = from + 1, "running schema migration step");
    let tx = conn.unchecked_transaction()?;
    match from {
        0 => migrate_v0_to_v1(&tx)?,
        1 => migrate_v1_to_v2(&tx)?,
        2 => migrate_v2_to_v3(&tx)?,
        3 => migrate_v3_to_v4(&tx)?,
        other => {
            // Unreachable once ensure_schema has validated the version.
            return Err(DbError::Integrity(format!(
                "no migration step starts at version {other}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}

/// v0 → v1: the deployment ledger becomes keyed by (chain, address).
/// Pre-existing rows were written before multi-chain support and belong to
/// the default chain.
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch("ALTER TABLE deployments RENAME TO deployments_migrate;")?;
    conn.execute_batch(schema::CREATE_DEPLOYMENTS)?;
    conn.execute(
        "INSERT INTO deployments
         (blockchain_id, contract_address, base_code_hash, full_code_hash,
          deployer_address, tx_hash, deployed_at, constructor_inputs)
         SELECT ?1, contract_address, base_code_hash, full_code_hash,
                deployer_address, tx_hash, deployed_at, constructor_inputs
         FROM deployments_migrate",
        [kiln_types::DEFAULT_CHAIN_ID as i64],
    )?;
    conn.execute_batch("DROP TABLE deployments_migrate;")?;
    Ok(())
}

/// v1 → v2: the ABI cache and the alias registry become chain-scoped, and
/// aliases gain their address index.
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    let default_chain = kiln_types::DEFAULT_CHAIN_ID as i64;

    conn.execute_batch("ALTER TABLE abi_cache RENAME TO abi_cache_migrate;")?;
    conn.execute_batch(schema::CREATE_ABI_CACHE)?;
    conn.execute(
        "INSERT INTO abi_cache (blockchain_id, contract_address, abi)
         SELECT ?1, contract_address, abi FROM abi_cache_migrate",
        [default_chain],
    )?;
    conn.execute_batch("DROP TABLE abi_cache_migrate;")?;

    conn.execute_batch("ALTER TABLE aliases RENAME TO aliases_migrate;")?;
    conn.execute_batch(schema::CREATE_ALIASES)?;
    conn.execute(
        "INSERT INTO aliases (blockchain_id, alias, address)
         SELECT ?1, alias, address FROM aliases_migrate",
        [default_chain],
    )?;
    conn.execute_batch("DROP TABLE aliases_migrate;")?;
    Ok(())
}

/// v2 → v3: compilations gain the language-version, compiler-options and
/// documentation columns (backfilled NULL) and the base-hash index.
fn migrate_v2_to_v3(conn: &Connection) -> Result<()> {
    conn.execute_batch("ALTER TABLE compilations RENAME TO compilations_migrate;")?;
    conn.execute_batch(schema::CREATE_COMPILATIONS)?;
    conn.execute_batch(
        "INSERT INTO compilations
         (full_code_hash, base_code_hash, auxdata, contract_name, source,
          language, compiler_version, abi, metadata_json)
         SELECT full_code_hash, base_code_hash, auxdata, contract_name, source,
                language, compiler_version, abi, metadata_json
         FROM compilations_migrate;
         DROP TABLE compilations_migrate;",
    )?;
    Ok(())
}

/// v3 → v4: the name-auction bid ledger arrives. Pure addition.
fn migrate_v3_to_v4(conn: &Connection) -> Result<()> {
    conn.execute_batch(schema::CREATE_BIDS)?;
    Ok(())
}

fn set_version(conn: &Connection, version: i64) -> Result<()> {
    set_metadata(conn, KEY_SCHEMA_VERSION, &version.to_string())
}

fn record_tool_version(conn: &Connection) -> Result<()> {
    set_metadata(conn, KEY_LAST_TOOL_VERSION, TOOL_VERSION)
}

/// Tool version that last wrote this schema, for upgrade messages.
fn written_by(conn: &Connection) -> Result<String> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [KEY_LAST_TOOL_VERSION],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.unwrap_or_else(|| "unknown".into()))
}

fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}
