//! Delta computation and effect classification.

use remedysim_core::action::{Action, NotificationChannel};
use remedysim_core::classifier::{classify_effect, compute_delta, generate_summary};
use remedysim_core::metrics::{
    BaselineMetrics, OverallEffect, SeverityCounts, SimulatedMetrics,
};
use remedysim_core::overrides::build_overrides;
use remedysim_core::reduction::apply_overrides;
use std::collections::BTreeMap;

fn baseline(alerts: u64, incidents: u64, notifications: u64, risk: f64) -> BaselineMetrics {
    BaselineMetrics {
        alerts_total: alerts,
        alerts_by_severity: SeverityCounts { critical: 0, high: 0, medium: alerts, low: 0 },
        incidents_total: incidents,
        correlations_total: 0,
        notifications_total: notifications,
        notifications_by_channel: None,
        avg_risk_score: risk,
        window_days: 30,
        computed_at: chrono::Utc::now(),
    }
}

fn simulated(alerts: u64, incidents: u64, notifications: u64, risk: f64) -> SimulatedMetrics {
    SimulatedMetrics {
        alerts_total: alerts,
        alerts_by_severity: SeverityCounts { critical: 0, high: 0, medium: alerts, low: 0 },
        incidents_total: incidents,
        correlations_total: 0,
        notifications_total: notifications,
        avg_risk_score: risk,
        rule_threshold_deltas: BTreeMap::new(),
    }
}

#[test]
fn zero_baseline_never_divides() {
    let delta = compute_delta(&baseline(0, 0, 0, 0.0), &simulated(0, 0, 0, 0.0));
    assert_eq!(delta.alerts.percent, 0.0);
    assert_eq!(delta.incidents.percent, 0.0);
    assert_eq!(delta.notifications.percent, 0.0);
    assert_eq!(delta.risk_score.percent, 0.0);
    assert_eq!(classify_effect(&delta), OverallEffect::Neutral);
}

#[test]
fn alert_drop_past_ten_percent_is_positive() {
    let delta = compute_delta(&baseline(1000, 50, 500, 65.5), &simulated(880, 50, 500, 65.5));
    assert_eq!(delta.alerts.percent, -12.0);
    assert_eq!(classify_effect(&delta), OverallEffect::Positive);
}

#[test]
fn incident_rise_past_ten_percent_is_negative() {
    let delta = compute_delta(&baseline(1000, 50, 500, 65.5), &simulated(1000, 60, 500, 65.5));
    assert_eq!(delta.incidents.percent, 20.0);
    assert_eq!(classify_effect(&delta), OverallEffect::Negative);
}

#[test]
fn mixed_signals_collapse_to_neutral() {
    let delta = compute_delta(&baseline(1000, 50, 500, 65.5), &simulated(880, 60, 500, 65.5));
    assert_eq!(classify_effect(&delta), OverallEffect::Neutral);
}

#[test]
fn small_changes_are_neutral() {
    let delta = compute_delta(&baseline(1000, 50, 500, 65.5), &simulated(950, 49, 480, 64.0));
    assert_eq!(classify_effect(&delta), OverallEffect::Neutral);
}

#[test]
fn thresholds_are_inclusive() {
    // Exactly -10% on alerts fires the improvement signal.
    let delta = compute_delta(&baseline(1000, 0, 0, 0.0), &simulated(900, 0, 0, 0.0));
    assert_eq!(delta.alerts.percent, -10.0);
    assert_eq!(classify_effect(&delta), OverallEffect::Positive);

    // Exactly +10% fires the degradation signal.
    let delta = compute_delta(&baseline(1000, 0, 0, 0.0), &simulated(1100, 0, 0, 0.0));
    assert_eq!(classify_effect(&delta), OverallEffect::Negative);

    // Risk score uses the tighter 5% band.
    let delta = compute_delta(&baseline(0, 0, 0, 60.0), &simulated(0, 0, 0, 57.0));
    assert_eq!(delta.risk_score.percent, -5.0);
    assert_eq!(classify_effect(&delta), OverallEffect::Positive);
}

#[test]
fn notifications_never_drive_classification() {
    // An 80% notification drop alone is informational, not an improvement.
    let delta = compute_delta(&baseline(1000, 50, 500, 65.5), &simulated(1000, 50, 100, 65.5));
    assert_eq!(delta.notifications.percent, -80.0);
    assert_eq!(classify_effect(&delta), OverallEffect::Neutral);
}

#[test]
fn summary_is_deterministic_and_numeric_only() {
    let base = baseline(1000, 50, 500, 65.5);
    let actions = [
        Action::DisableRule { rule_id: "r1".to_string() },
        Action::SuppressNotificationChannel {
            channel: NotificationChannel::Email,
            duration_minutes: 240,
        },
    ];
    let sim = apply_overrides(&base, &build_overrides(&actions));
    let delta = compute_delta(&base, &sim);
    let effect = classify_effect(&delta);

    let first = generate_summary(&base, &delta, effect);
    let second = generate_summary(&base, &delta, effect);
    assert_eq!(first, second);
    assert_eq!(
        first,
        "Alerts -12.0% (1000 -> 880), incidents +0.0% (50 -> 50), \
         notifications -80.0% (500 -> 100), avg risk score -12.1% (65.5 -> 57.6). \
         Net effect: positive."
    );
}
