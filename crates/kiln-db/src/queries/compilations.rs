//! Compiled-artifact metadata, keyed by the full-code content address.

use kiln_types::compilation::CompilationRecord;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::{DbError, Result};

/// Insert or replace a compilation wholesale. Replacement is row-level
/// last-writer-wins; callers needing field-level merging reconcile the
/// records in memory first (see `CompilationRecord::reconcile`).
///
/// The referenced code record must already exist; a missing one surfaces
/// the engine's foreign-key violation untranslated.
pub fn upsert(conn: &Connection, record: &CompilationRecord) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO compilations
         (full_code_hash, base_code_hash, auxdata, contract_name, source,
          language, language_version, compiler_version, compiler_options,
          abi, user_doc, developer_doc, metadata_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        rusqlite::params![
            record.full_code_hash,
            record.base_code_hash,
            record.auxdata,
            record.contract_name,
            record.source,
            record.language,
            record.language_version,
            record.compiler_version,
            record.compiler_options,
            json_to_text(record.abi.as_ref())?,
            json_to_text(record.user_doc.as_ref())?,
            json_to_text(record.developer_doc.as_ref())?,
            record.metadata_json,
        ],
    )?;
    Ok(())
}

/// Fetch a compilation by full-code content address.
pub fn select(conn: &Connection, full_code_hash: &str) -> Result<Option<CompilationRecord>> {
    let record = conn
        .query_row(
            "SELECT full_code_hash, base_code_hash, auxdata, contract_name, source,
                    language, language_version, compiler_version, compiler_options,
                    abi, user_doc, developer_doc, metadata_json
             FROM compilations WHERE full_code_hash = ?1",
            [full_code_hash],
            row_to_record,
        )
        .optional()?;
    record
        .map(|(record, abi, user_doc, developer_doc)| {
            Ok(CompilationRecord {
                abi: text_to_json(abi)?,
                user_doc: text_to_json(user_doc)?,
                developer_doc: text_to_json(developer_doc)?,
                ..record
            })
        })
        .transpose()
}

/// Replace (or clear) the stored ABI of the one compilation matching both
/// content addresses. Touching more than one row means the store has lost
/// key uniqueness and is treated as fatal.
pub fn update_abi(
    conn: &Connection,
    base_code_hash: &str,
    full_code_hash: &str,
    abi: Option<&serde_json::Value>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE compilations SET abi = ?1
         WHERE base_code_hash = ?2 AND full_code_hash = ?3",
        rusqlite::params![json_to_text(abi)?, base_code_hash, full_code_hash],
    )?;
    if updated > 1 {
        return Err(DbError::Integrity(format!(
            "abi update for {full_code_hash} touched {updated} rows; \
             the store is inconsistent, restore from a snapshot"
        )));
    }
    Ok(())
}

/// Drop every compilation that was never deployed on any chain, and return
/// how many went. Deployed artifacts stay reproducible; raw code and the
/// deployment ledger are never touched.
pub fn cull(conn: &Connection) -> Result<usize> {
    let removed = conn.execute(
        "DELETE FROM compilations
         WHERE full_code_hash NOT IN (SELECT full_code_hash FROM deployments)",
        [],
    )?;
    tracing::debug!(removed, "culled undeployed compilations");
    Ok(removed)
}

type RawRecord = (CompilationRecord, Option<String>, Option<String>, Option<String>);

/// Maps a row to the record plus its still-serialized JSON columns; the
/// caller finishes decoding outside rusqlite's error type.
fn row_to_record(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    let record = CompilationRecord {
        full_code_hash: row.get(0)?,
        base_code_hash: row.get(1)?,
        auxdata: row.get(2)?,
        contract_name: row.get(3)?,
        source: row.get(4)?,
        language: row.get(5)?,
        language_version: row.get(6)?,
        compiler_version: row.get(7)?,
        compiler_options: row.get(8)?,
        abi: None,
        user_doc: None,
        developer_doc: None,
        metadata_json: row.get(12)?,
    };
    Ok((record, row.get(9)?, row.get(10)?, row.get(11)?))
}

fn json_to_text(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    value
        .map(|v| serde_json::to_string(v).map_err(|e| DbError::Serialization(e.to_string())))
        .transpose()
}

fn text_to_json(text: Option<String>) -> Result<Option<serde_json::Value>> {
    text.map(|t| {
        serde_json::from_str(&t).map_err(|e| DbError::Serialization(e.to_string()))
    })
    .transpose()
}
