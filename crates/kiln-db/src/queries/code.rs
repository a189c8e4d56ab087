//! Raw contract code, keyed by content address.

use rusqlite::{Connection, OptionalExtension};

use crate::Result;

/// Store a piece of raw code under its content address and return the
/// address. Identical hash means identical content, so an existing row is
/// left untouched; a REPLACE here would needlessly cascade into dependent
/// compilations.
pub fn upsert(conn: &Connection, code: &[u8]) -> Result<String> {
    let base_code_hash = kiln_hash::content_address(code);
    conn.execute(
        "INSERT OR IGNORE INTO code (base_code_hash, code) VALUES (?1, ?2)",
        rusqlite::params![base_code_hash, code],
    )?;
    Ok(base_code_hash)
}

/// Fetch raw code by content address.
pub fn select(conn: &Connection, base_code_hash: &str) -> Result<Option<Vec<u8>>> {
    let code = conn
        .query_row(
            "SELECT code FROM code WHERE base_code_hash = ?1",
            [base_code_hash],
            |row| row.get(0),
        )
        .optional()?;
    Ok(code)
}

/// Delete a code record. Dependent compilations go with it.
pub fn delete(conn: &Connection, base_code_hash: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM code WHERE base_code_hash = ?1",
        [base_code_hash],
    )?;
    Ok(())
}
