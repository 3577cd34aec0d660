//! The run orchestrator — owns the simulation-run lifecycle.
//!
//! PIPELINE (fixed, documented, never reordered):
//!   1. Load the playbook (tenant-scoped).
//!   2. Re-validate its config, even though it was validated when stored.
//!   3. Create the run row with status=running.
//!   4. Baseline -> overrides -> simulated -> delta -> effect -> summary,
//!      entirely in memory. Nothing is persisted between these steps.
//!   5. Finalize in a single write: completed with all payloads, or failed
//!      with a sanitized message.
//!
//! RULES:
//!   - Validation failures block run creation entirely; no run row exists
//!     for a malformed playbook.
//!   - Once a run row exists, failures are absorbed into its terminal
//!     state. The caller still gets a well-formed run to inspect.
//!   - running -> {completed, failed} happens exactly once. Terminal rows
//!     are never written again; there is no mutation API for runs.

use crate::baseline::collect_baseline;
use crate::classifier::{classify_effect, compute_delta, generate_summary};
use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::metrics::{BaselineMetrics, DeltaMetrics, OverallEffect, SimulatedMetrics};
use crate::overrides::build_overrides;
use crate::playbook::{Playbook, PlaybookDraft, PlaybookPatch};
use crate::reduction::{apply_overrides, MODEL_VERSION};
use crate::store::SimStore;
use crate::types::{PlaybookId, RunId, TenantId};
use crate::validator::validate_playbook_config;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// One immutable, auditable execution record of the simulation pipeline.
///
/// Invariants: `simulated_metrics`, `delta_metrics`, and `overall_effect`
/// are present iff `status == Completed`; `error_message` iff
/// `status == Failed`. A run that failed before the baseline read finished
/// carries no `baseline_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub run_id: RunId,
    pub tenant_id: TenantId,
    pub playbook_id: PlaybookId,
    pub status: RunStatus,
    pub window_days: u32,
    /// Version of the reduction constants table the run was computed with.
    pub model_version: String,
    pub baseline_metrics: Option<BaselineMetrics>,
    pub simulated_metrics: Option<SimulatedMetrics>,
    pub delta_metrics: Option<DeltaMetrics>,
    pub overall_effect: Option<OverallEffect>,
    pub summary: Option<String>,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

pub struct SimEngine {
    pub store: SimStore,
    pub config: SimConfig,
}

impl SimEngine {
    pub fn new(store: SimStore, config: SimConfig) -> Self {
        Self { store, config }
    }

    // ── Playbooks ──────────────────────────────────────────────

    pub fn create_playbook(
        &self,
        tenant_id: &str,
        draft: PlaybookDraft,
    ) -> SimResult<Playbook> {
        let mut errors = Vec::new();
        if draft.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        errors.extend(validate_playbook_config(&draft.config).errors);
        if !errors.is_empty() {
            return Err(SimError::Validation { errors });
        }

        let now = Utc::now();
        let playbook = Playbook {
            playbook_id: format!("pb-{}", Uuid::new_v4()),
            tenant_id: tenant_id.to_string(),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            is_active: true,
            config: draft.config,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_playbook(&playbook)?;
        log::info!("playbook {} created", playbook.playbook_id);
        Ok(playbook)
    }

    pub fn get_playbook(&self, tenant_id: &str, playbook_id: &str) -> SimResult<Playbook> {
        self.store
            .get_playbook(tenant_id, playbook_id)?
            .ok_or(SimError::NotFound("playbook"))
    }

    pub fn list_playbooks(&self, tenant_id: &str) -> SimResult<Vec<Playbook>> {
        self.store.list_playbooks(tenant_id)
    }

    pub fn update_playbook(
        &self,
        tenant_id: &str,
        playbook_id: &str,
        patch: PlaybookPatch,
    ) -> SimResult<Playbook> {
        let mut playbook = self.get_playbook(tenant_id, playbook_id)?;

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(SimError::validation("name must not be empty"));
            }
            playbook.name = name;
        }
        if let Some(description) = patch.description {
            playbook.description = Some(description);
        }
        if let Some(category) = patch.category {
            playbook.category = Some(category);
        }
        if let Some(is_active) = patch.is_active {
            playbook.is_active = is_active;
        }
        if let Some(config) = patch.config {
            let report = validate_playbook_config(&config);
            if !report.valid {
                return Err(SimError::Validation { errors: report.errors });
            }
            playbook.config = config;
        }
        playbook.updated_at = Utc::now();

        self.store.update_playbook(&playbook)?;
        log::info!("playbook {playbook_id} updated");
        Ok(playbook)
    }

    pub fn delete_playbook(&self, tenant_id: &str, playbook_id: &str) -> SimResult<()> {
        if !self.store.delete_playbook(tenant_id, playbook_id)? {
            return Err(SimError::NotFound("playbook"));
        }
        log::info!("playbook {playbook_id} deleted");
        Ok(())
    }

    // ── Runs ───────────────────────────────────────────────────

    /// Read the tenant's baseline snapshot for a trailing window.
    pub fn baseline_metrics(
        &self,
        tenant_id: &str,
        window_days: u32,
    ) -> SimResult<BaselineMetrics> {
        collect_baseline(&self.store, &self.config, tenant_id, window_days)
    }

    /// Execute the full pipeline synchronously and return the finalized run.
    pub fn run_simulation(
        &self,
        tenant_id: &str,
        playbook_id: &str,
        window_days: Option<u32>,
    ) -> SimResult<SimulationRun> {
        let window_days = window_days.unwrap_or(self.config.default_window_days);
        if window_days == 0 || window_days > self.config.max_window_days {
            return Err(SimError::validation(format!(
                "window_days must be between 1 and {}",
                self.config.max_window_days
            )));
        }

        let playbook = self.get_playbook(tenant_id, playbook_id)?;

        // Defense in depth: a row edited out-of-band may be invalid even
        // though create/update validated it.
        let report = validate_playbook_config(&playbook.config);
        if !report.valid {
            return Err(SimError::Validation { errors: report.errors });
        }

        let run_id = format!("run-{}", Uuid::new_v4());
        self.store.insert_run(
            &run_id,
            tenant_id,
            playbook_id,
            window_days,
            MODEL_VERSION,
            Utc::now(),
        )?;
        log::info!("run {run_id} started (playbook {playbook_id}, window {window_days}d)");

        match self.baseline_metrics(tenant_id, window_days) {
            Ok(baseline) => {
                // Pure section — no I/O, no failure modes until the write.
                let overrides = build_overrides(&playbook.config.actions);
                let simulated = apply_overrides(&baseline, &overrides);
                let delta = compute_delta(&baseline, &simulated);
                let effect = classify_effect(&delta);
                let mut summary = generate_summary(&baseline, &delta, effect);
                if !overrides.rule_threshold_deltas.is_empty() {
                    summary.push_str(&format!(
                        " Threshold adjustments recorded for {} rule(s); they do not \
                         change simulated totals under model {}.",
                        overrides.rule_threshold_deltas.len(),
                        MODEL_VERSION
                    ));
                }

                self.store.finalize_run_completed(
                    &run_id, &baseline, &simulated, &delta, effect, &summary,
                    Utc::now(),
                )?;
                log::info!("run {run_id} completed: {}", effect.as_str());
            }
            Err(err) => {
                // The run row exists; absorb the failure into its terminal
                // state. Internals stay in the server log.
                log::error!("run {run_id} failed: {err}");
                self.store.finalize_run_failed(
                    &run_id,
                    &sanitize_error(&err),
                    Utc::now(),
                )?;
            }
        }

        self.get_run(tenant_id, &run_id)
    }

    pub fn get_run(&self, tenant_id: &str, run_id: &str) -> SimResult<SimulationRun> {
        self.store.get_run(tenant_id, run_id)?.ok_or(SimError::NotFound("run"))
    }

    /// Paginated run listing, newest first.
    pub fn list_runs(
        &self,
        tenant_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> SimResult<Vec<SimulationRun>> {
        let (limit, offset) = self.page(limit, offset);
        self.store.list_runs(tenant_id, limit, offset)
    }

    /// Runs scoped to one playbook, newest first.
    pub fn list_runs_for_playbook(
        &self,
        tenant_id: &str,
        playbook_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> SimResult<Vec<SimulationRun>> {
        // 404 for a playbook the tenant does not own, same as GET on it.
        self.get_playbook(tenant_id, playbook_id)?;
        let (limit, offset) = self.page(limit, offset);
        self.store.list_runs_for_playbook(tenant_id, playbook_id, limit, offset)
    }

    /// Reconciliation: a hard process crash can leave runs `running`
    /// forever. Mark anything past the ceiling as failed with reason
    /// `timeout`.
    pub fn sweep_stale_runs(&self) -> SimResult<usize> {
        let cutoff = Utc::now() - Duration::seconds(self.config.stale_run_ceiling_secs);
        let swept = self.store.sweep_stale_runs(cutoff, "timeout")?;
        if swept > 0 {
            log::warn!("swept {swept} stale running run(s) to failed");
        }
        Ok(swept)
    }

    fn page(&self, limit: Option<u32>, offset: Option<u32>) -> (u32, u32) {
        let limit = limit
            .unwrap_or(self.config.default_page_limit)
            .min(self.config.max_page_limit);
        (limit, offset.unwrap_or(0))
    }
}

/// What a failed run records. Taxonomy messages only — database and
/// serialization details never reach the client.
fn sanitize_error(err: &SimError) -> String {
    match err {
        SimError::DataUnavailable(reason) => format!("baseline data unavailable: {reason}"),
        SimError::Validation { errors } => {
            format!("playbook config invalid: {}", errors.join("; "))
        }
        SimError::NotFound(what) => format!("{what} not found"),
        SimError::Conflict(message) => message.clone(),
        SimError::Database(_) | SimError::Serialization(_) | SimError::Other(_) => {
            "internal error during simulation".to_string()
        }
    }
}
