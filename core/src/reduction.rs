//! The reduction engine — baseline -> simulated under a fixed heuristic
//! model.
//!
//! MODEL v1 (constants below; every run is stamped with `MODEL_VERSION`, so
//! changing a constant means bumping the version — historical runs must stay
//! reproducible):
//!
//!   - Each disabled rule multiplies alert volume by 0.88, compounding:
//!     factor = 0.88^N. Severity buckets and the average risk score scale by
//!     the same factor (risk tracks alert volume in this model).
//!   - Each suppressed channel removes 80% of that channel's observed share
//!     of notifications. Without a per-channel breakdown, the whole total
//!     scales by 0.2 per suppressed channel: 0.2^K.
//!   - Each unit of positive min-link-count delta multiplies incident
//!     volume by 0.95: factor = 0.95^delta.
//!   - A correlation-window delta of d minutes multiplies incident volume
//!     by `1 - 0.05 * sign(d) * min(|d| / 30, 1)`: widening reduces
//!     incidents up to a 5% cap per 30-minute increment, narrowing
//!     increases them symmetrically.
//!   - Counts round half-away-from-zero to whole numbers and never go below
//!     zero; the average risk score keeps one decimal place.

use crate::metrics::{BaselineMetrics, SeverityCounts, SimulatedMetrics};
use crate::overrides::SimulationOverrides;

/// Version stamp for the constants below. Stored on every run.
pub const MODEL_VERSION: &str = "v1";

/// Alert volume retained per disabled rule (12% reduction each).
pub const DISABLED_RULE_ALERT_FACTOR: f64 = 0.88;

/// Notification volume retained per suppressed channel (80% reduction).
pub const SUPPRESSED_CHANNEL_KEEP_FACTOR: f64 = 0.20;

/// Incident volume retained per unit of min-link-count delta.
pub const MIN_LINK_INCIDENT_FACTOR: f64 = 0.95;

/// Incident swing per full window step, and the step size in minutes.
pub const WINDOW_INCIDENT_STEP: f64 = 0.05;
pub const WINDOW_STEP_MINUTES: f64 = 30.0;

/// Apply the overrides to a baseline snapshot. Pure and deterministic.
pub fn apply_overrides(
    baseline: &BaselineMetrics,
    overrides: &SimulationOverrides,
) -> SimulatedMetrics {
    let alert_factor = alert_factor(overrides);

    SimulatedMetrics {
        alerts_total: scale_count(baseline.alerts_total, alert_factor),
        alerts_by_severity: SeverityCounts {
            critical: scale_count(baseline.alerts_by_severity.critical, alert_factor),
            high: scale_count(baseline.alerts_by_severity.high, alert_factor),
            medium: scale_count(baseline.alerts_by_severity.medium, alert_factor),
            low: scale_count(baseline.alerts_by_severity.low, alert_factor),
        },
        incidents_total: scale_count(baseline.incidents_total, incident_factor(overrides)),
        correlations_total: baseline.correlations_total,
        notifications_total: simulate_notifications(baseline, overrides),
        avg_risk_score: round1(baseline.avg_risk_score * alert_factor),
        rule_threshold_deltas: overrides.rule_threshold_deltas.clone(),
    }
}

/// Composite factor applied to alert volume (and to the risk score).
fn alert_factor(overrides: &SimulationOverrides) -> f64 {
    DISABLED_RULE_ALERT_FACTOR.powi(overrides.disabled_rules.len() as i32)
}

/// Composite factor applied to incident volume.
fn incident_factor(overrides: &SimulationOverrides) -> f64 {
    let link_factor = if overrides.min_link_count_delta > 0 {
        MIN_LINK_INCIDENT_FACTOR.powi(overrides.min_link_count_delta as i32)
    } else {
        1.0
    };
    let delta = overrides.correlation_window_minutes_delta as f64;
    let window_factor = 1.0
        - WINDOW_INCIDENT_STEP * delta.signum() * (delta.abs() / WINDOW_STEP_MINUTES).min(1.0);
    link_factor * window_factor
}

fn simulate_notifications(
    baseline: &BaselineMetrics,
    overrides: &SimulationOverrides,
) -> u64 {
    if overrides.suppressed_channels.is_empty() {
        return baseline.notifications_total;
    }
    match &baseline.notifications_by_channel {
        Some(by_channel) => {
            // Remove 80% of each suppressed channel's observed share.
            let removed: f64 = overrides
                .suppressed_channels
                .keys()
                .map(|channel| {
                    by_channel.get(channel).copied().unwrap_or(0) as f64
                        * (1.0 - SUPPRESSED_CHANNEL_KEEP_FACTOR)
                })
                .sum();
            clamp_round(baseline.notifications_total as f64 - removed)
        }
        None => {
            let factor =
                SUPPRESSED_CHANNEL_KEEP_FACTOR.powi(overrides.suppressed_channels.len() as i32);
            scale_count(baseline.notifications_total, factor)
        }
    }
}

fn scale_count(count: u64, factor: f64) -> u64 {
    clamp_round(count as f64 * factor)
}

fn clamp_round(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

/// Round to one decimal place, half away from zero.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
