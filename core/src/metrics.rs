//! Metric snapshots flowing through the simulation pipeline.

use crate::action::{NotificationChannel, ThresholdMetric};
use crate::types::RuleId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alert counts bucketed by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl SeverityCounts {
    pub fn total(&self) -> u64 {
        self.critical + self.high + self.medium + self.low
    }
}

/// Real aggregate counters observed over a trailing window. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineMetrics {
    pub alerts_total: u64,
    pub alerts_by_severity: SeverityCounts,
    pub incidents_total: u64,
    pub correlations_total: u64,
    pub notifications_total: u64,
    /// Per-channel send counts when the rollup source exports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_by_channel: Option<BTreeMap<NotificationChannel, u64>>,
    pub avg_risk_score: f64,
    pub window_days: u32,
    pub computed_at: DateTime<Utc>,
}

/// The counters as they would look with the playbook active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedMetrics {
    pub alerts_total: u64,
    pub alerts_by_severity: SeverityCounts,
    pub incidents_total: u64,
    pub correlations_total: u64,
    pub notifications_total: u64,
    pub avg_risk_score: f64,
    /// Threshold adjustments carried through for transparency. They do not
    /// alter the numeric reduction in this model version; the run summary
    /// says so whenever this map is non-empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rule_threshold_deltas: BTreeMap<RuleId, BTreeMap<ThresholdMetric, i64>>,
}

/// Absolute and relative change of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    pub absolute: f64,
    /// Percent of baseline, one decimal. 0 when the baseline is 0.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaMetrics {
    pub alerts: MetricDelta,
    pub incidents: MetricDelta,
    pub correlations: MetricDelta,
    pub notifications: MetricDelta,
    pub risk_score: MetricDelta,
}

/// Three-way classification of a playbook's simulated net impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallEffect {
    Positive,
    Neutral,
    Negative,
}

impl OverallEffect {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallEffect::Positive => "positive",
            OverallEffect::Neutral => "neutral",
            OverallEffect::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(OverallEffect::Positive),
            "neutral" => Some(OverallEffect::Neutral),
            "negative" => Some(OverallEffect::Negative),
            _ => None,
        }
    }
}
