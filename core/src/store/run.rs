//! Simulation-run ledger queries.
//!
//! Finalization is a single UPDATE guarded by `status = 'running'`, so the
//! running -> terminal transition happens exactly once per run no matter
//! how many writers race.

use super::{parse_ts, SimStore};
use crate::engine::{RunStatus, SimulationRun};
use crate::error::{SimError, SimResult};
use crate::metrics::{BaselineMetrics, DeltaMetrics, OverallEffect, SimulatedMetrics};
use chrono::{DateTime, Utc};
use rusqlite::params;

/// Raw row before JSON payloads are parsed.
struct RunRow {
    run_id: String,
    tenant_id: String,
    playbook_id: String,
    status: RunStatus,
    window_days: u32,
    model_version: String,
    baseline_json: Option<String>,
    simulated_json: Option<String>,
    delta_json: Option<String>,
    overall_effect: Option<String>,
    summary: Option<String>,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

const COLUMNS: &str = "run_id, tenant_id, playbook_id, status, window_days, model_version, \
                       baseline_json, simulated_json, delta_json, overall_effect, summary, \
                       error_message, started_at, finished_at";

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    let status_raw: String = row.get(3)?;
    let status = RunStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown run status {status_raw}").into(),
        )
    })?;
    let finished_at = match row.get::<_, Option<String>>(13)? {
        Some(raw) => Some(parse_ts(&raw, 13)?),
        None => None,
    };
    Ok(RunRow {
        run_id: row.get(0)?,
        tenant_id: row.get(1)?,
        playbook_id: row.get(2)?,
        status,
        window_days: row.get::<_, i64>(4)? as u32,
        model_version: row.get(5)?,
        baseline_json: row.get(6)?,
        simulated_json: row.get(7)?,
        delta_json: row.get(8)?,
        overall_effect: row.get(9)?,
        summary: row.get(10)?,
        error_message: row.get(11)?,
        started_at: parse_ts(&row.get::<_, String>(12)?, 12)?,
        finished_at,
    })
}

impl RunRow {
    fn into_run(self) -> SimResult<SimulationRun> {
        let baseline_metrics: Option<BaselineMetrics> =
            self.baseline_json.as_deref().map(serde_json::from_str).transpose()?;
        let simulated_metrics: Option<SimulatedMetrics> =
            self.simulated_json.as_deref().map(serde_json::from_str).transpose()?;
        let delta_metrics: Option<DeltaMetrics> =
            self.delta_json.as_deref().map(serde_json::from_str).transpose()?;
        Ok(SimulationRun {
            run_id: self.run_id,
            tenant_id: self.tenant_id,
            playbook_id: self.playbook_id,
            status: self.status,
            window_days: self.window_days,
            model_version: self.model_version,
            baseline_metrics,
            simulated_metrics,
            delta_metrics,
            overall_effect: self.overall_effect.as_deref().and_then(OverallEffect::parse),
            summary: self.summary,
            error_message: self.error_message,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

impl SimStore {
    pub fn insert_run(
        &self,
        run_id: &str,
        tenant_id: &str,
        playbook_id: &str,
        window_days: u32,
        model_version: &str,
        started_at: DateTime<Utc>,
    ) -> SimResult<()> {
        self.conn().execute(
            "INSERT INTO simulation_run (run_id, tenant_id, playbook_id, status,
                                         window_days, model_version, started_at)
             VALUES (?1, ?2, ?3, 'running', ?4, ?5, ?6)",
            params![
                run_id,
                tenant_id,
                playbook_id,
                window_days as i64,
                model_version,
                started_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// running -> completed, with every result payload, in one write.
    pub fn finalize_run_completed(
        &self,
        run_id: &str,
        baseline: &BaselineMetrics,
        simulated: &SimulatedMetrics,
        delta: &DeltaMetrics,
        effect: OverallEffect,
        summary: &str,
        finished_at: DateTime<Utc>,
    ) -> SimResult<()> {
        let updated = self.conn().execute(
            "UPDATE simulation_run
             SET status = 'completed', baseline_json = ?2, simulated_json = ?3,
                 delta_json = ?4, overall_effect = ?5, summary = ?6, finished_at = ?7
             WHERE run_id = ?1 AND status = 'running'",
            params![
                run_id,
                serde_json::to_string(baseline)?,
                serde_json::to_string(simulated)?,
                serde_json::to_string(delta)?,
                effect.as_str(),
                summary,
                finished_at.to_rfc3339(),
            ],
        )?;
        finalized_once(run_id, updated)
    }

    /// running -> failed. No simulated/delta/effect payloads, ever.
    pub fn finalize_run_failed(
        &self,
        run_id: &str,
        error_message: &str,
        finished_at: DateTime<Utc>,
    ) -> SimResult<()> {
        let updated = self.conn().execute(
            "UPDATE simulation_run
             SET status = 'failed', error_message = ?2, finished_at = ?3
             WHERE run_id = ?1 AND status = 'running'",
            params![run_id, error_message, finished_at.to_rfc3339()],
        )?;
        finalized_once(run_id, updated)
    }

    pub fn get_run(&self, tenant_id: &str, run_id: &str) -> SimResult<Option<SimulationRun>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM simulation_run WHERE tenant_id = ?1 AND run_id = ?2"
        ))?;
        let mut rows = stmt.query_map(params![tenant_id, run_id], map_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?.into_run()?)),
            None => Ok(None),
        }
    }

    pub fn list_runs(
        &self,
        tenant_id: &str,
        limit: u32,
        offset: u32,
    ) -> SimResult<Vec<SimulationRun>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM simulation_run WHERE tenant_id = ?1
             ORDER BY started_at DESC, run_id DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
            .query_map(params![tenant_id, limit as i64, offset as i64], map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RunRow::into_run).collect()
    }

    pub fn list_runs_for_playbook(
        &self,
        tenant_id: &str,
        playbook_id: &str,
        limit: u32,
        offset: u32,
    ) -> SimResult<Vec<SimulationRun>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {COLUMNS} FROM simulation_run
             WHERE tenant_id = ?1 AND playbook_id = ?2
             ORDER BY started_at DESC, run_id DESC LIMIT ?3 OFFSET ?4"
        ))?;
        let rows = stmt
            .query_map(
                params![tenant_id, playbook_id, limit as i64, offset as i64],
                map_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RunRow::into_run).collect()
    }

    /// Mark every run still `running` since before `cutoff` as failed.
    /// Returns how many rows were swept.
    pub fn sweep_stale_runs(
        &self,
        cutoff: DateTime<Utc>,
        reason: &str,
    ) -> SimResult<usize> {
        let swept = self.conn().execute(
            "UPDATE simulation_run
             SET status = 'failed', error_message = ?2, finished_at = ?3
             WHERE status = 'running' AND started_at < ?1",
            params![cutoff.to_rfc3339(), reason, Utc::now().to_rfc3339()],
        )?;
        Ok(swept)
    }
}

fn finalized_once(run_id: &str, updated: usize) -> SimResult<()> {
    if updated == 0 {
        return Err(SimError::Conflict(format!("run {run_id} is already finalized")));
    }
    Ok(())
}
