//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine and collectors call store methods — they never execute SQL.

mod playbook;
mod rollup;
mod run;

pub use rollup::RollupTotals;

use crate::error::SimResult;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_monitoring_rollups.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Tenant ─────────────────────────────────────────────────

    pub fn upsert_tenant(&self, tenant_id: &str, name: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO tenant (tenant_id, name, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(tenant_id) DO UPDATE SET name = excluded.name",
            params![tenant_id, name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn tenant_exists(&self, tenant_id: &str) -> SimResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM tenant WHERE tenant_id = ?1",
                params![tenant_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

/// Timestamps are stored as RFC 3339 in UTC; one format everywhere keeps
/// lexicographic ordering equal to chronological ordering.
pub(crate) fn parse_ts(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
