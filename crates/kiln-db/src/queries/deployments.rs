//! The per-chain deployment ledger.
//!
//! One row per (chain, address), written once at deployment time and never
//! updated. Rows reference the artifact store by content address only; the
//! link is not enforced by the engine, so a deployment can outlive a culled
//! compilation while the raw code stays reproducible.

use std::collections::BTreeSet;

use kiln_types::ChainId;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::Result;

/// One deployment of a contract, immutable once recorded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeploymentRow {
    pub blockchain_id: ChainId,
    pub contract_address: String,
    pub base_code_hash: String,
    pub full_code_hash: String,
    pub deployer_address: Option<String>,
    pub tx_hash: Option<String>,
    pub deployed_at: Option<u64>,
    pub constructor_inputs: Option<Vec<u8>>,
}

/// Record a deployment. Both content addresses are derived from the code as
/// it went on chain, with the auxdata suffix stripped for the base address.
///
/// The (chain, address) key is written exactly once; re-recording it is a
/// caller bug and surfaces the engine's constraint violation.
pub fn insert(
    conn: &Connection,
    blockchain_id: ChainId,
    contract_address: &str,
    code: &[u8],
    deployer_address: Option<&str>,
    tx_hash: Option<&str>,
    deployed_at: Option<u64>,
    constructor_inputs: Option<&[u8]>,
) -> Result<()> {
    let full_code_hash = kiln_hash::content_address(code);
    let (base_code, _auxdata) = kiln_hash::split_auxdata(code);
    let base_code_hash = kiln_hash::content_address(base_code);
    conn.execute(
        "INSERT INTO deployments
         (blockchain_id, contract_address, base_code_hash, full_code_hash,
          deployer_address, tx_hash, deployed_at, constructor_inputs)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            blockchain_id as i64,
            contract_address,
            base_code_hash,
            full_code_hash,
            deployer_address,
            tx_hash,
            deployed_at.map(|t| t as i64),
            constructor_inputs,
        ],
    )?;
    Ok(())
}

/// Fetch one deployment by key.
pub fn select_one(
    conn: &Connection,
    blockchain_id: ChainId,
    contract_address: &str,
) -> Result<Option<DeploymentRow>> {
    let row = conn
        .query_row(
            "SELECT blockchain_id, contract_address, base_code_hash, full_code_hash,
                    deployer_address, tx_hash, deployed_at, constructor_inputs
             FROM deployments
             WHERE blockchain_id = ?1 AND contract_address = ?2",
            rusqlite::params![blockchain_id as i64, contract_address],
            row_to_deployment,
        )
        .optional()?;
    Ok(row)
}

/// All deployed addresses on one chain, ordered by address.
pub fn select_addresses(conn: &Connection, blockchain_id: ChainId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT contract_address FROM deployments
         WHERE blockchain_id = ?1 ORDER BY contract_address",
    )?;
    let rows = stmt
        .query_map([blockchain_id as i64], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Deployments of one artifact on one chain, as a value-deduplicated set.
pub fn select_for_code(
    conn: &Connection,
    blockchain_id: ChainId,
    full_code_hash: &str,
) -> Result<BTreeSet<DeploymentRow>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT blockchain_id, contract_address, base_code_hash, full_code_hash,
                deployer_address, tx_hash, deployed_at, constructor_inputs
         FROM deployments
         WHERE blockchain_id = ?1 AND full_code_hash = ?2",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::params![blockchain_id as i64, full_code_hash],
            row_to_deployment,
        )?
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    Ok(rows)
}

/// Deployments of one artifact across every chain, as a value-deduplicated
/// set.
pub fn select_for_code_any_chain(
    conn: &Connection,
    full_code_hash: &str,
) -> Result<BTreeSet<DeploymentRow>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT blockchain_id, contract_address, base_code_hash, full_code_hash,
                deployer_address, tx_hash, deployed_at, constructor_inputs
         FROM deployments
         WHERE full_code_hash = ?1",
    )?;
    let rows = stmt
        .query_map([full_code_hash], row_to_deployment)?
        .collect::<std::result::Result<BTreeSet<_>, _>>()?;
    Ok(rows)
}

fn row_to_deployment(row: &Row<'_>) -> rusqlite::Result<DeploymentRow> {
    Ok(DeploymentRow {
        blockchain_id: row.get::<_, i64>(0)? as ChainId,
        contract_address: row.get(1)?,
        base_code_hash: row.get(2)?,
        full_code_hash: row.get(3)?,
        deployer_address: row.get(4)?,
        tx_hash: row.get(5)?,
        deployed_at: row.get::<_, Option<i64>>(6)?.map(|t| t as u64),
        constructor_inputs: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    /// Deployable code with a well-formed auxdata trailer.
    fn deployable(tag: u8) -> Vec<u8> {
        let mut code = vec![0x60, 0x80, tag];
        code.extend_from_slice(b"\xa2\x64ipfs\x00\x06");
        code
    }

    #[test]
    fn test_insert_and_select_one() {
        let conn = test_db();
        let code = deployable(1);
        insert(
            &conn,
            1,
            "0x0a",
            &code,
            Some("0x99"),
            Some("0xdead"),
            Some(1_700_000_000),
            Some(&[0x01, 0x02]),
        )
        .expect("insert");

        let row = select_one(&conn, 1, "0x0a").expect("select").expect("present");
        assert_eq!(row.full_code_hash, kiln_hash::content_address(&code));
        assert_eq!(row.base_code_hash, kiln_hash::content_address(&code[..3]));
        assert_eq!(row.deployer_address.as_deref(), Some("0x99"));
        assert_eq!(row.deployed_at, Some(1_700_000_000));
        assert_eq!(row.constructor_inputs.as_deref(), Some(&[0x01, 0x02][..]));
    }

    #[test]
    fn test_duplicate_key_is_refused() {
        let conn = test_db();
        insert(&conn, 1, "0x0a", &deployable(1), None, None, None, None).expect("first");
        let err = insert(&conn, 1, "0x0a", &deployable(2), None, None, None, None)
            .expect_err("must refuse");
        assert!(matches!(err, crate::DbError::Sqlite(_)));
    }

    #[test]
    fn test_same_address_on_two_chains() {
        let conn = test_db();
        insert(&conn, 1, "0x0a", &deployable(1), None, None, None, None).expect("chain 1");
        insert(&conn, 5, "0x0a", &deployable(2), None, None, None, None).expect("chain 5");

        assert!(select_one(&conn, 1, "0x0a").expect("select").is_some());
        assert!(select_one(&conn, 5, "0x0a").expect("select").is_some());
        assert!(select_one(&conn, 9, "0x0a").expect("select").is_none());
    }

    #[test]
    fn test_addresses_are_ordered() {
        let conn = test_db();
        insert(&conn, 1, "0x0c", &deployable(1), None, None, None, None).expect("insert");
        insert(&conn, 1, "0x0a", &deployable(2), None, None, None, None).expect("insert");
        insert(&conn, 5, "0x0b", &deployable(3), None, None, None, None).expect("insert");

        let addresses = select_addresses(&conn, 1).expect("list");
        assert_eq!(addresses, vec!["0x0a".to_string(), "0x0c".to_string()]);
    }

    #[test]
    fn test_select_for_code_scopes_by_chain() {
        let conn = test_db();
        let code = deployable(1);
        let full = kiln_hash::content_address(&code);
        insert(&conn, 1, "0x0a", &code, None, None, None, None).expect("insert");
        insert(&conn, 1, "0x0b", &code, None, None, None, None).expect("insert");
        insert(&conn, 5, "0x0a", &code, None, None, None, None).expect("insert");

        let on_chain_1 = select_for_code(&conn, 1, &full).expect("select");
        assert_eq!(on_chain_1.len(), 2);
        assert!(on_chain_1.iter().all(|d| d.blockchain_id == 1));

        let everywhere = select_for_code_any_chain(&conn, &full).expect("select");
        assert_eq!(everywhere.len(), 3);
    }
}
