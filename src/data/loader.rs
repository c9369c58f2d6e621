// ============================================================
// Layer 4 — Observation Loader
// ============================================================
// Reads every occupancy row from the SQLite store:
//
//   SELECT name, year, month, day, chunk, percentage FROM BibData
//
// No filtering is pushed down into SQL; deduplication and
// ordering happen in the series store. The connection lives
// only for the duration of `load_all` and is closed as soon as
// the rows are collected.
//
// Reference: rusqlite crate documentation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use rusqlite::{Connection, OpenFlags};

use crate::domain::observation::{ChronoKey, Observation};
use crate::domain::traits::ObservationSource;

/// Default table name used by the scraper
pub const DEFAULT_TABLE: &str = "BibData";

pub struct SqliteObservationSource {
    path:  PathBuf,
    table: String,
}

impl SqliteObservationSource {
    pub fn new(path: impl AsRef<Path>, table: impl Into<String>) -> Self {
        Self { path: path.as_ref().to_path_buf(), table: table.into() }
    }

    fn query(&self) -> String {
        // Table names cannot be bound as parameters; quote instead
        format!(
            "SELECT name, year, month, day, chunk, percentage FROM \"{}\"",
            self.table.replace('"', "\"\"")
        )
    }
}

impl ObservationSource for SqliteObservationSource {
    fn load_all(&self) -> Result<Vec<Observation>> {
        // Read-only: opening a missing path must fail rather than
        // silently creating an empty database.
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Cannot open database '{}'", self.path.display()))?;

        let rows = {
            let mut stmt = conn
                .prepare(&self.query())
                .with_context(|| format!("Cannot query table '{}'", self.table))?;

            let mapped = stmt.query_map([], |row| {
                Ok(Observation::new(
                    row.get::<_, String>(0)?,
                    ChronoKey::new(row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?),
                    row.get::<_, f64>(5)?,
                ))
            })?;

            let rows = mapped
                .collect::<rusqlite::Result<Vec<_>>>()
                .with_context(|| format!("Malformed row in '{}'", self.table))?;
            rows
        };

        conn.close()
            .map_err(|(_, e)| e)
            .with_context(|| format!("Cannot close database '{}'", self.path.display()))?;

        tracing::info!("Loaded {} rows from '{}'", rows.len(), self.path.display());
        Ok(rows)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{synthetic_rows, write_sqlite};

    #[test]
    fn test_reads_every_row() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.db");
        let rows = synthetic_rows(&["A3", "B2"], 50, 1);
        write_sqlite(&path, &rows);

        let loaded = SqliteObservationSource::new(&path, DEFAULT_TABLE).load_all().unwrap();
        assert_eq!(loaded.len(), 100);
        assert!(loaded.iter().any(|o| o.entity == "B2" && o.key == rows[60].key));
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = SqliteObservationSource::new(dir.path().join("nope.db"), DEFAULT_TABLE);
        assert!(src.load_all().is_err());
        assert!(!dir.path().join("nope.db").exists());
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.db");
        write_sqlite(&path, &synthetic_rows(&["A3"], 3, 1));
        let src  = SqliteObservationSource::new(&path, "Other");
        assert!(src.load_all().is_err());
    }
}
