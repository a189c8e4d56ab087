//! Pre-migration snapshots.
//!
//! A migration chain rewrites tables in place, so the snapshot taken before
//! the first step is the only recovery path if the chain dies midway. A
//! snapshotter must either produce a durable copy or fail the migration;
//! silently skipping is not an option.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::queries::settings;
use crate::{DbError, Result};

/// Produces a durable copy of the store before a migration chain runs.
pub trait Snapshotter {
    /// Snapshot the store as it exists at schema `version`.
    fn snapshot(&self, conn: &Connection, version: i64) -> Result<()>;
}

/// Writes a compacted copy of the live database with `VACUUM INTO`.
///
/// The snapshot lands at `<dir>/<stem>.v<version>.backup.db`. An existing
/// file at that path is never overwritten; the migration fails instead.
pub struct VacuumSnapshotter {
    dir: PathBuf,
    stem: String,
}

impl VacuumSnapshotter {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Snapshotter for the database at `path`: honours the store's
    /// `BackupDirectory` setting when one is recorded, otherwise snapshots
    /// next to the database file.
    pub fn for_database(path: &Path, conn: &Connection) -> Result<Self> {
        let configured = if crate::table_exists(conn, "metadata")? {
            settings::backup_directory(conn)?
        } else {
            None
        };
        let dir = match configured {
            Some(dir) => PathBuf::from(dir),
            None => path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("kiln")
            .to_string();
        Ok(Self::new(dir, stem))
    }

    fn target(&self, version: i64) -> PathBuf {
        self.dir.join(format!("{}.v{version}.backup.db", self.stem))
    }
}

impl Snapshotter for VacuumSnapshotter {
    fn snapshot(&self, conn: &Connection, version: i64) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DbError::Snapshot(format!("cannot create {}: {e}", self.dir.display()))
        })?;
        let target = self.target(version);
        if target.exists() {
            return Err(DbError::Snapshot(format!(
                "refusing to overwrite existing snapshot {}",
                target.display()
            )));
        }
        tracing::info!(target = %target.display(), version, "writing pre-migration snapshot");
        conn.execute("VACUUM INTO ?1", [target.to_string_lossy().into_owned()])?;
        Ok(())
    }
}

/// No-op snapshotter for in-memory stores and tests that exercise the
/// migration chain directly.
pub struct NoSnapshot;

impl Snapshotter for NoSnapshot {
    fn snapshot(&self, _conn: &Connection, _version: i64) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vacuum_snapshot_is_openable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = crate::open_memory().expect("open");
        conn.execute(
            "INSERT INTO code (base_code_hash, code) VALUES ('aa', x'6080')",
            [],
        )
        .expect("insert");

        let snapshotter = VacuumSnapshotter::new(dir.path(), "kiln");
        snapshotter.snapshot(&conn, 2).expect("snapshot");

        let target = dir.path().join("kiln.v2.backup.db");
        assert!(target.exists());

        let copy = Connection::open(&target).expect("open snapshot");
        let count: i64 = copy
            .query_row("SELECT COUNT(*) FROM code", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let conn = crate::open_memory().expect("open");

        let snapshotter = VacuumSnapshotter::new(dir.path(), "kiln");
        snapshotter.snapshot(&conn, 3).expect("first snapshot");

        let err = snapshotter.snapshot(&conn, 3).expect_err("must refuse");
        assert!(matches!(err, DbError::Snapshot(_)));
    }

    #[test]
    fn test_for_database_defaults_next_to_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("repo.db");
        let conn = Connection::open(&path).expect("open");

        let snapshotter = VacuumSnapshotter::for_database(&path, &conn).expect("build");
        assert_eq!(snapshotter.target(1), dir.path().join("repo.v1.backup.db"));
    }

    #[test]
    fn test_for_database_honours_backup_directory_setting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("repo.db");
        let conn = crate::open_with(&path, &NoSnapshot).expect("open");
        settings::set_backup_directory(&conn, "/var/backups/kiln").expect("setting");

        let snapshotter = VacuumSnapshotter::for_database(&path, &conn).expect("build");
        assert_eq!(
            snapshotter.target(4),
            Path::new("/var/backups/kiln").join("repo.v4.backup.db")
        );
    }
}
