//! The remediation action DSL.
//!
//! Five action kinds, a closed set. The enum is matched exhaustively by the
//! validator, the override builder, and the reduction engine, so an unknown
//! action kind is a deserialization error — never something silently
//! ignored.

use crate::types::RuleId;
use serde::{Deserialize, Serialize};

// ── Parameter bounds ─────────────────────────────────────────────────────────

pub const THRESHOLD_DELTA_MIN: i64 = -50;
pub const THRESHOLD_DELTA_MAX: i64 = 50;
pub const WINDOW_DELTA_MIN: i64 = -30;
pub const WINDOW_DELTA_MAX: i64 = 120;
pub const MIN_LINK_DELTA_MIN: i64 = 1;
pub const MIN_LINK_DELTA_MAX: i64 = 5;
pub const SUPPRESS_DURATION_MIN: i64 = 15; // minutes
pub const SUPPRESS_DURATION_MAX: i64 = 1440; // 24 hours

/// Which numeric knob of a rule a threshold adjustment targets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMetric {
    Severity,
    Threshold,
    Confidence,
}

impl ThresholdMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            ThresholdMetric::Severity => "severity",
            ThresholdMetric::Threshold => "threshold",
            ThresholdMetric::Confidence => "confidence",
        }
    }
}

/// Notification channels a playbook may suppress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Slack,
    Webhook,
    Pagerduty,
}

impl NotificationChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Slack => "slack",
            NotificationChannel::Webhook => "webhook",
            NotificationChannel::Pagerduty => "pagerduty",
        }
    }

    /// Parse the stored channel name. Returns None for anything outside the
    /// closed set (the schema CHECK constraint should make that impossible).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(NotificationChannel::Email),
            "slack" => Some(NotificationChannel::Slack),
            "webhook" => Some(NotificationChannel::Webhook),
            "pagerduty" => Some(NotificationChannel::Pagerduty),
            _ => None,
        }
    }
}

/// One remediation action. Tagged on the wire as `{"type": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    AdjustRuleThreshold {
        rule_id: RuleId,
        metric: ThresholdMetric,
        delta: i64,
    },
    DisableRule {
        rule_id: RuleId,
    },
    AdjustCorrelationWindow {
        window_minutes_delta: i64,
    },
    IncreaseMinLinkCount {
        delta: i64,
    },
    SuppressNotificationChannel {
        channel: NotificationChannel,
        duration_minutes: i64,
    },
}

/// Deterministic display summary of an action.
/// Display-only — nothing in the pipeline branches on this string.
pub fn describe_action(action: &Action) -> String {
    match action {
        Action::AdjustRuleThreshold { rule_id, metric, delta } => {
            format!("Adjust {} of rule {} by {:+}", metric.as_str(), rule_id, delta)
        }
        Action::DisableRule { rule_id } => format!("Disable rule {rule_id}"),
        Action::AdjustCorrelationWindow { window_minutes_delta } => {
            format!("Adjust correlation window by {window_minutes_delta:+} minutes")
        }
        Action::IncreaseMinLinkCount { delta } => {
            format!("Increase minimum link count by {delta}")
        }
        Action::SuppressNotificationChannel { channel, duration_minutes } => {
            format!(
                "Suppress {} notifications for {} minutes",
                channel.as_str(),
                duration_minutes
            )
        }
    }
}
