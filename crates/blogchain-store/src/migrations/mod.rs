//! Schema versioning for the `kv` table.
//!
//! `PRAGMA user_version` holds the last applied step. Every open applies the
//! steps above it in order and bumps the version after each one, so a
//! database written by a newer build is refused rather than guessed at.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// `(version, name, step)`, ascending.
const STEPS: &[(u32, &str, Step)] = &[(1, "v001_initial", v001_initial::up)];

/// Schema version this build writes.
pub const CURRENT_VERSION: u32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if found > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "schema v{found} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    for &(version, name, step) in STEPS.iter().filter(|(v, _, _)| *v > found) {
        tracing::info!(version, name, "applying kv schema step");
        step(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    tracing::debug!(from = found, to = CURRENT_VERSION, "kv schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(version(&conn), CURRENT_VERSION);

        run_migrations(&conn).unwrap();
        assert_eq!(version(&conn), CURRENT_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'kv'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1)
            .unwrap();
        let err = run_migrations(&conn).unwrap_err();
        assert!(matches!(err, StoreError::Migration(_)));
    }
}
