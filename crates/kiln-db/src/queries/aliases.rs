//! Human-friendly address aliases, scoped per chain.
//!
//! One alias maps to exactly one address; one address may carry several
//! aliases.

use kiln_types::ChainId;
use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// Insert or replace an alias.
pub fn upsert(
    conn: &Connection,
    blockchain_id: ChainId,
    alias: &str,
    address: &str,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO aliases (blockchain_id, alias, address) VALUES (?1, ?2, ?3)",
        rusqlite::params![blockchain_id as i64, alias, address],
    )?;
    Ok(())
}

/// Insert an alias, failing if the (chain, alias) key already exists.
pub fn insert(
    conn: &Connection,
    blockchain_id: ChainId,
    alias: &str,
    address: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO aliases (blockchain_id, alias, address) VALUES (?1, ?2, ?3)",
        rusqlite::params![blockchain_id as i64, alias, address],
    )?;
    Ok(())
}

/// Resolve an alias to its address.
pub fn select_by_alias(
    conn: &Connection,
    blockchain_id: ChainId,
    alias: &str,
) -> Result<Option<String>> {
    let address = conn
        .query_row(
            "SELECT address FROM aliases WHERE blockchain_id = ?1 AND alias = ?2",
            rusqlite::params![blockchain_id as i64, alias],
            |row| row.get(0),
        )
        .optional()?;
    Ok(address)
}

/// All aliases carried by one address, descending by alias.
pub fn select_by_address(
    conn: &Connection,
    blockchain_id: ChainId,
    address: &str,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT alias FROM aliases
         WHERE blockchain_id = ?1 AND address = ?2 ORDER BY alias DESC",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![blockchain_id as i64, address], |row| {
            row.get(0)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// The full alias → address mapping for one chain, ascending by alias.
pub fn select_all(conn: &Connection, blockchain_id: ChainId) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT alias, address FROM aliases WHERE blockchain_id = ?1 ORDER BY alias",
    )?;
    let rows = stmt
        .query_map([blockchain_id as i64], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove an alias.
pub fn delete(conn: &Connection, blockchain_id: ChainId, alias: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM aliases WHERE blockchain_id = ?1 AND alias = ?2",
        rusqlite::params![blockchain_id as i64, alias],
    )?;
    Ok(())
}
