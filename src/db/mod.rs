pub mod issue;
pub mod link;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;

const MIGRATION: &str = include_str!("../../migrations/001_init.sql");

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        Self::configure(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?)
    }

    /// Resolve the default location: `WAYPOINT_DB` env var if set,
    /// otherwise `~/.waypoint/waypoint.db`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(p) = std::env::var("WAYPOINT_DB") {
            return Ok(PathBuf::from(p));
        }
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".waypoint").join("waypoint.db"))
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&Self::default_path()?)
    }

    fn configure(conn: Connection) -> Result<Self> {
        // WAL for concurrent readers; in-memory databases report "memory".
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        anyhow::ensure!(
            mode == "wal" || mode == "memory",
            "unexpected journal mode: {mode}"
        );
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Apply the schema. Safe to call repeatedly; every statement carries
    /// `IF NOT EXISTS`.
    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(MIGRATION)
            .context("failed to run database migration")
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
