//! Playbook database queries.

use super::{parse_ts, SimStore};
use crate::error::{SimError, SimResult};
use crate::playbook::Playbook;
use rusqlite::params;

/// Raw row before the config blob is parsed.
struct PlaybookRow {
    playbook_id: String,
    tenant_id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    is_active: bool,
    config_json: String,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

const COLUMNS: &str = "playbook_id, tenant_id, name, description, category, is_active, \
                       config_json, created_at, updated_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlaybookRow> {
    Ok(PlaybookRow {
        playbook_id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
        config_json: row.get(6)?,
        created_at: parse_ts(&row.get::<_, String>(7)?, 7)?,
        updated_at: parse_ts(&row.get::<_, String>(8)?, 8)?,
    })
}

impl PlaybookRow {
    fn into_playbook(self) -> SimResult<Playbook> {
        Ok(Playbook {
            config: serde_json::from_str(&self.config_json)?,
            playbook_id: self.playbook_id,
            tenant_id: self.tenant_id,
            name: self.name,
            description: self.description,
            category: self.category,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SimStore {
    pub fn insert_playbook(&self, playbook: &Playbook) -> SimResult<()> {
        let config_json = serde_json::to_string(&playbook.config)?;
        self.conn()
            .execute(
                "INSERT INTO playbook (playbook_id, tenant_id, name, description, category,
                                       is_active, config_json, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    playbook.playbook_id,
                    playbook.tenant_id,
                    playbook.name,
                    playbook.description,
                    playbook.category,
                    playbook.is_active as i64,
                    config_json,
                    playbook.created_at.to_rfc3339(),
                    playbook.updated_at.to_rfc3339(),
                ],
            )
            .map_err(name_conflict)?;
        Ok(())
    }

    pub fn get_playbook(
        &self,
        tenant_id: &str,
        playbook_id: &str,
    ) -> SimResult<Option<Playbook>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM playbook WHERE tenant_id = ?1 AND playbook_id = ?2"
        ))?;
        let mut rows = stmt.query_map(params![tenant_id, playbook_id], map_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_playbook()?)),
            None => Ok(None),
        }
    }

    pub fn list_playbooks(&self, tenant_id: &str) -> SimResult<Vec<Playbook>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM playbook WHERE tenant_id = ?1 ORDER BY created_at DESC, playbook_id"
        ))?;
        let rows = stmt
            .query_map(params![tenant_id], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(PlaybookRow::into_playbook).collect()
    }

    pub fn update_playbook(&self, playbook: &Playbook) -> SimResult<()> {
        let config_json = serde_json::to_string(&playbook.config)?;
        self.conn()
            .execute(
                "UPDATE playbook
                 SET name = ?3, description = ?4, category = ?5, is_active = ?6,
                     config_json = ?7, updated_at = ?8
                 WHERE tenant_id = ?1 AND playbook_id = ?2",
                params![
                    playbook.tenant_id,
                    playbook.playbook_id,
                    playbook.name,
                    playbook.description,
                    playbook.category,
                    playbook.is_active as i64,
                    config_json,
                    playbook.updated_at.to_rfc3339(),
                ],
            )
            .map_err(name_conflict)?;
        Ok(())
    }

    /// Returns false when the tenant owns no such playbook.
    pub fn delete_playbook(&self, tenant_id: &str, playbook_id: &str) -> SimResult<bool> {
        let deleted = self.conn().execute(
            "DELETE FROM playbook WHERE tenant_id = ?1 AND playbook_id = ?2",
            params![tenant_id, playbook_id],
        )?;
        Ok(deleted > 0)
    }
}

/// The (tenant_id, name) unique constraint surfaces as a conflict the
/// client can fix, not as a generic database error.
fn name_conflict(err: rusqlite::Error) -> SimError {
    if let rusqlite::Error::SqliteFailure(_, Some(ref message)) = err {
        if message.contains("playbook.tenant_id") && message.contains("playbook.name") {
            return SimError::Conflict(
                "a playbook with this name already exists for the tenant".to_string(),
            );
        }
    }
    SimError::Database(err)
}
