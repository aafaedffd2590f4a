//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. State is only reachable
//! through [`Database::transact`] and [`Database::read`], which hand out a
//! [`StoreTx`] scoped to one SQLite transaction.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::{Connection, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::kv::StoreTx;
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/blogchain/blogchain.db`
    /// - macOS:   `~/Library/Application Support/com.blogchain.blogchain/blogchain.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\blogchain\blogchain\data\blogchain.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "blogchain", "blogchain").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("blogchain.db");

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Open a private in-memory database. Used by tests and ephemeral nodes.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Run `f` inside one write transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`. On `Err` it is
    /// dropped, which rolls back every write `f` made, sequence advances
    /// included.
    pub fn transact<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut StoreTx<'_>) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let mut store_tx = StoreTx::new(tx);

        match f(&mut store_tx) {
            Ok(value) => {
                store_tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!("operation failed, rolling back transaction");
                Err(err)
            }
        }
    }

    /// Run `f` against a consistent snapshot. Nothing is ever committed.
    pub fn read<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&StoreTx<'_>) -> std::result::Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(StoreError::from)?;
        let store_tx = StoreTx::new(tx);
        f(&store_tx)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }
}
