//! Repository settings stored in the `metadata` table.
//!
//! The schema-version keys in the same table are owned by the migration
//! engine and cannot be written through this module.

use rusqlite::{Connection, OptionalExtension};

use crate::schema::{KEY_API_KEY, KEY_BACKUP_DIRECTORY, KEY_LAST_TOOL_VERSION, KEY_SCHEMA_VERSION};
use crate::{DbError, Result};

/// Get a setting value by key.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Set a setting value.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if key == KEY_SCHEMA_VERSION || key == KEY_LAST_TOOL_VERSION {
        return Err(DbError::Configuration(format!(
            "metadata key '{key}' is managed by the migration engine"
        )));
    }
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value],
    )?;
    Ok(())
}

/// Delete a setting.
pub fn delete(conn: &Connection, key: &str) -> Result<()> {
    if key == KEY_SCHEMA_VERSION || key == KEY_LAST_TOOL_VERSION {
        return Err(DbError::Configuration(format!(
            "metadata key '{key}' is managed by the migration engine"
        )));
    }
    conn.execute("DELETE FROM metadata WHERE key = ?1", [key])?;
    Ok(())
}

/// API key for deployment-related network services.
pub fn api_key(conn: &Connection) -> Result<Option<String>> {
    get(conn, KEY_API_KEY)
}

pub fn set_api_key(conn: &Connection, value: &str) -> Result<()> {
    set(conn, KEY_API_KEY, value)
}

/// Directory pre-migration snapshots are written to, when configured.
pub fn backup_directory(conn: &Connection) -> Result<Option<String>> {
    get(conn, KEY_BACKUP_DIRECTORY)
}

pub fn set_backup_directory(conn: &Connection, value: &str) -> Result<()> {
    set(conn, KEY_BACKUP_DIRECTORY, value)
}
