//! Folding a validated action list into one overrides structure.

use crate::action::{Action, NotificationChannel, ThresholdMetric};
use crate::types::RuleId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory overrides for one simulation run. Built fresh per run,
/// discarded after use.
///
/// Ordered collections keep serialized output byte-stable between runs of
/// the same playbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationOverrides {
    pub disabled_rules: BTreeSet<RuleId>,
    pub rule_threshold_deltas: BTreeMap<RuleId, BTreeMap<ThresholdMetric, i64>>,
    /// Channel -> winning suppression duration in minutes.
    pub suppressed_channels: BTreeMap<NotificationChannel, i64>,
    pub min_link_count_delta: i64,
    pub correlation_window_minutes_delta: i64,
}

/// Pure fold over the action list.
///
/// Accumulation policies for repeated actions of the same kind:
///   - `DisableRule`: set semantics; a duplicate rule id is a no-op.
///   - `SuppressNotificationChannel`: the longest duration wins per channel.
///   - `IncreaseMinLinkCount` / `AdjustCorrelationWindow`: deltas sum.
///   - `AdjustRuleThreshold`: deltas sum per (rule, metric).
pub fn build_overrides(actions: &[Action]) -> SimulationOverrides {
    let mut overrides = SimulationOverrides::default();
    for action in actions {
        match action {
            Action::DisableRule { rule_id } => {
                overrides.disabled_rules.insert(rule_id.clone());
            }
            Action::AdjustRuleThreshold { rule_id, metric, delta } => {
                *overrides
                    .rule_threshold_deltas
                    .entry(rule_id.clone())
                    .or_default()
                    .entry(*metric)
                    .or_insert(0) += delta;
            }
            Action::SuppressNotificationChannel { channel, duration_minutes } => {
                let winning = overrides.suppressed_channels.entry(*channel).or_insert(0);
                *winning = (*winning).max(*duration_minutes);
            }
            Action::IncreaseMinLinkCount { delta } => {
                overrides.min_link_count_delta += delta;
            }
            Action::AdjustCorrelationWindow { window_minutes_delta } => {
                overrides.correlation_window_minutes_delta += window_minutes_delta;
            }
        }
    }
    overrides
}
