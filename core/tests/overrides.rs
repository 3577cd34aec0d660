//! Override builder: accumulation policies for repeated actions.

use remedysim_core::action::{Action, NotificationChannel, ThresholdMetric};
use remedysim_core::overrides::{build_overrides, SimulationOverrides};

#[test]
fn empty_action_list_builds_empty_overrides() {
    assert_eq!(build_overrides(&[]), SimulationOverrides::default());
}

#[test]
fn duplicate_disable_rule_is_a_no_op() {
    let overrides = build_overrides(&[
        Action::DisableRule { rule_id: "r1".to_string() },
        Action::DisableRule { rule_id: "r2".to_string() },
        Action::DisableRule { rule_id: "r1".to_string() },
    ]);
    assert_eq!(overrides.disabled_rules.len(), 2);
    assert!(overrides.disabled_rules.contains("r1"));
    assert!(overrides.disabled_rules.contains("r2"));
}

#[test]
fn longest_suppression_duration_wins_per_channel() {
    let overrides = build_overrides(&[
        Action::SuppressNotificationChannel {
            channel: NotificationChannel::Email,
            duration_minutes: 60,
        },
        Action::SuppressNotificationChannel {
            channel: NotificationChannel::Email,
            duration_minutes: 240,
        },
        Action::SuppressNotificationChannel {
            channel: NotificationChannel::Email,
            duration_minutes: 120,
        },
    ]);
    assert_eq!(overrides.suppressed_channels.len(), 1);
    assert_eq!(overrides.suppressed_channels[&NotificationChannel::Email], 240);
}

#[test]
fn min_link_count_deltas_sum() {
    let overrides = build_overrides(&[
        Action::IncreaseMinLinkCount { delta: 2 },
        Action::IncreaseMinLinkCount { delta: 3 },
    ]);
    assert_eq!(overrides.min_link_count_delta, 5);
}

#[test]
fn correlation_window_deltas_sum() {
    let overrides = build_overrides(&[
        Action::AdjustCorrelationWindow { window_minutes_delta: 30 },
        Action::AdjustCorrelationWindow { window_minutes_delta: -10 },
    ]);
    assert_eq!(overrides.correlation_window_minutes_delta, 20);
}

#[test]
fn threshold_deltas_sum_per_rule_and_metric() {
    let overrides = build_overrides(&[
        Action::AdjustRuleThreshold {
            rule_id: "r1".to_string(),
            metric: ThresholdMetric::Severity,
            delta: 10,
        },
        Action::AdjustRuleThreshold {
            rule_id: "r1".to_string(),
            metric: ThresholdMetric::Severity,
            delta: -4,
        },
        Action::AdjustRuleThreshold {
            rule_id: "r1".to_string(),
            metric: ThresholdMetric::Confidence,
            delta: 5,
        },
        Action::AdjustRuleThreshold {
            rule_id: "r2".to_string(),
            metric: ThresholdMetric::Severity,
            delta: 7,
        },
    ]);
    let r1 = &overrides.rule_threshold_deltas["r1"];
    assert_eq!(r1[&ThresholdMetric::Severity], 6);
    assert_eq!(r1[&ThresholdMetric::Confidence], 5);
    assert_eq!(overrides.rule_threshold_deltas["r2"][&ThresholdMetric::Severity], 7);
}

#[test]
fn mixed_playbook_folds_every_kind() {
    let overrides = build_overrides(&[
        Action::DisableRule { rule_id: "r1".to_string() },
        Action::AdjustCorrelationWindow { window_minutes_delta: 45 },
        Action::IncreaseMinLinkCount { delta: 1 },
        Action::SuppressNotificationChannel {
            channel: NotificationChannel::Webhook,
            duration_minutes: 30,
        },
        Action::AdjustRuleThreshold {
            rule_id: "r3".to_string(),
            metric: ThresholdMetric::Threshold,
            delta: -20,
        },
    ]);
    assert_eq!(overrides.disabled_rules.len(), 1);
    assert_eq!(overrides.correlation_window_minutes_delta, 45);
    assert_eq!(overrides.min_link_count_delta, 1);
    assert_eq!(overrides.suppressed_channels.len(), 1);
    assert_eq!(overrides.rule_threshold_deltas.len(), 1);
}
