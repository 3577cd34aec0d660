//! Baseline metrics collection.
//!
//! RULES:
//!   - Reads only pre-aggregated counters scoped to one tenant. No raw
//!     event payloads, no per-user identifiers.
//!   - An empty window is a valid all-zero baseline, not an error.
//!   - An unresolvable tenant fails fast with `DataUnavailable`.
//!   - The read is wall-clock bounded; overruns map to `DataUnavailable`
//!     and the orchestrator absorbs them into a failed run.

use crate::config::SimConfig;
use crate::error::{SimError, SimResult};
use crate::metrics::BaselineMetrics;
use crate::reduction::round1;
use crate::store::SimStore;
use chrono::{Duration, Utc};
use std::time::Instant;

pub fn collect_baseline(
    store: &SimStore,
    config: &SimConfig,
    tenant_id: &str,
    window_days: u32,
) -> SimResult<BaselineMetrics> {
    if !store.tenant_exists(tenant_id)? {
        return Err(SimError::DataUnavailable(format!(
            "tenant {tenant_id} cannot be resolved"
        )));
    }

    let started = Instant::now();
    let since = (Utc::now() - Duration::days(i64::from(window_days))).date_naive();
    let totals = store.monitoring_totals_since(tenant_id, since)?;
    let by_channel = store.notification_totals_since(tenant_id, since)?;

    if started.elapsed().as_secs() >= config.baseline_timeout_secs {
        return Err(SimError::DataUnavailable("baseline read timed out".to_string()));
    }

    Ok(BaselineMetrics {
        alerts_total: totals.alerts.total(),
        alerts_by_severity: totals.alerts,
        incidents_total: totals.incidents,
        correlations_total: totals.correlations,
        notifications_total: totals.notifications,
        notifications_by_channel: if by_channel.is_empty() { None } else { Some(by_channel) },
        avg_risk_score: round1(totals.risk_score_avg),
        window_days,
        computed_at: Utc::now(),
    })
}
