//! SQLite storage for time capsules.

pub mod migrations;
pub mod models;
pub mod queries;
pub mod repository;

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use tracing::info;

pub use repository::SqliteTimeCapsuleRepository;

/// One connection shared by the API handlers and the dispatcher. Every
/// statement runs under the lock, so writes from both sides serialize.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the capsule store at `path` and bring its schema
    /// up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening capsule store {}", path.display()))?;

        // WAL so outside readers of the file never block the writer.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let db = Self::prepare(conn)?;
        info!("Capsule store ready at {}", path.display());
        Ok(db)
    }

    /// Throwaway store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        migrations::run(&conn).context("migrating capsule schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("capsule store lock poisoned"))?;
        f(&conn)
    }
}
