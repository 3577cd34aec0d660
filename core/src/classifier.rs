//! Delta computation and overall-effect classification.
//!
//! Alerts and incidents move the classification at +/-10%; the risk score
//! at +/-5%. Notifications and correlations are informational only and
//! never drive the verdict.

use crate::metrics::{
    BaselineMetrics, DeltaMetrics, MetricDelta, OverallEffect, SimulatedMetrics,
};
use crate::reduction::round1;

pub const COUNT_SIGNAL_PERCENT: f64 = 10.0;
pub const RISK_SIGNAL_PERCENT: f64 = 5.0;

/// Per-metric absolute and percent deltas, simulated minus baseline.
pub fn compute_delta(
    baseline: &BaselineMetrics,
    simulated: &SimulatedMetrics,
) -> DeltaMetrics {
    DeltaMetrics {
        alerts: metric_delta(baseline.alerts_total as f64, simulated.alerts_total as f64),
        incidents: metric_delta(
            baseline.incidents_total as f64,
            simulated.incidents_total as f64,
        ),
        correlations: metric_delta(
            baseline.correlations_total as f64,
            simulated.correlations_total as f64,
        ),
        notifications: metric_delta(
            baseline.notifications_total as f64,
            simulated.notifications_total as f64,
        ),
        risk_score: metric_delta(baseline.avg_risk_score, simulated.avg_risk_score),
    }
}

fn metric_delta(baseline: f64, simulated: f64) -> MetricDelta {
    let absolute = simulated - baseline;
    // Percent change against a zero baseline is undefined; 0 by convention.
    let percent = if baseline == 0.0 { 0.0 } else { round1(absolute / baseline * 100.0) };
    MetricDelta { absolute, percent }
}

/// Positive iff at least one improvement signal fires and no degradation
/// signal does; negative iff the reverse. Mixed and no-significant-change
/// both collapse to neutral.
pub fn classify_effect(delta: &DeltaMetrics) -> OverallEffect {
    let improvements = [
        delta.alerts.percent <= -COUNT_SIGNAL_PERCENT,
        delta.incidents.percent <= -COUNT_SIGNAL_PERCENT,
        delta.risk_score.percent <= -RISK_SIGNAL_PERCENT,
    ]
    .into_iter()
    .filter(|fired| *fired)
    .count();
    let degradations = [
        delta.alerts.percent >= COUNT_SIGNAL_PERCENT,
        delta.incidents.percent >= COUNT_SIGNAL_PERCENT,
        delta.risk_score.percent >= RISK_SIGNAL_PERCENT,
    ]
    .into_iter()
    .filter(|fired| *fired)
    .count();

    if improvements > 0 && degradations == 0 {
        OverallEffect::Positive
    } else if degradations > 0 && improvements == 0 {
        OverallEffect::Negative
    } else {
        OverallEffect::Neutral
    }
}

/// Deterministic, human-readable run summary. Built purely from the
/// numbers — no tenant identifiers, nothing personal.
pub fn generate_summary(
    baseline: &BaselineMetrics,
    delta: &DeltaMetrics,
    effect: OverallEffect,
) -> String {
    format!(
        "Alerts {} ({} -> {}), incidents {} ({} -> {}), notifications {} ({} -> {}), \
         avg risk score {} ({:.1} -> {:.1}). Net effect: {}.",
        fmt_percent(delta.alerts.percent),
        baseline.alerts_total,
        shifted(baseline.alerts_total, delta.alerts.absolute),
        fmt_percent(delta.incidents.percent),
        baseline.incidents_total,
        shifted(baseline.incidents_total, delta.incidents.absolute),
        fmt_percent(delta.notifications.percent),
        baseline.notifications_total,
        shifted(baseline.notifications_total, delta.notifications.absolute),
        fmt_percent(delta.risk_score.percent),
        baseline.avg_risk_score,
        baseline.avg_risk_score + delta.risk_score.absolute,
        effect.as_str(),
    )
}

fn fmt_percent(percent: f64) -> String {
    format!("{percent:+.1}%")
}

fn shifted(base: u64, absolute: f64) -> u64 {
    (base as f64 + absolute).round().max(0.0) as u64
}
