//! Manually cached ABI definitions for contracts with no stored
//! compilation, keyed by (chain, address).
//!
//! Duplicate keys are refused; callers wanting replace semantics delete
//! first. The alias registry is the only table here that exposes a true
//! upsert for this key shape, by design choice.

use kiln_types::ChainId;
use rusqlite::{Connection, OptionalExtension};

use crate::{DbError, Result};

/// Cache an ABI. Fails on a duplicate (chain, address) key.
pub fn insert(
    conn: &Connection,
    blockchain_id: ChainId,
    contract_address: &str,
    abi: &serde_json::Value,
) -> Result<()> {
    let abi_text =
        serde_json::to_string(abi).map_err(|e| DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO abi_cache (blockchain_id, contract_address, abi) VALUES (?1, ?2, ?3)",
        rusqlite::params![blockchain_id as i64, contract_address, abi_text],
    )?;
    Ok(())
}

/// Fetch a cached ABI.
pub fn select(
    conn: &Connection,
    blockchain_id: ChainId,
    contract_address: &str,
) -> Result<Option<serde_json::Value>> {
    let text: Option<String> = conn
        .query_row(
            "SELECT abi FROM abi_cache WHERE blockchain_id = ?1 AND contract_address = ?2",
            rusqlite::params![blockchain_id as i64, contract_address],
            |row| row.get(0),
        )
        .optional()?;
    text.map(|t| {
        serde_json::from_str(&t).map_err(|e| DbError::Serialization(e.to_string()))
    })
    .transpose()
}

/// Drop a cached ABI.
pub fn delete(conn: &Connection, blockchain_id: ChainId, contract_address: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM abi_cache WHERE blockchain_id = ?1 AND contract_address = ?2",
        rusqlite::params![blockchain_id as i64, contract_address],
    )?;
    Ok(())
}

/// All cached addresses on one chain, ordered by address, descending.
pub fn select_addresses(conn: &Connection, blockchain_id: ChainId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT contract_address FROM abi_cache
         WHERE blockchain_id = ?1 ORDER BY contract_address DESC",
    )?;
    let rows = stmt
        .query_map([blockchain_id as i64], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
