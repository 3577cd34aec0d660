//! Playbook config validation.
//!
//! RULES:
//!   - Validation is pure: same config in, same report out, every time.
//!   - Actions are checked independently; errors accumulate, they never
//!     short-circuit.
//!   - Enum membership and required fields are enforced at the serde
//!     boundary. This module checks what the type system cannot: numeric
//!     bounds, empty identifiers, and the action count.

use crate::action::{
    Action, MIN_LINK_DELTA_MAX, MIN_LINK_DELTA_MIN, SUPPRESS_DURATION_MAX,
    SUPPRESS_DURATION_MIN, THRESHOLD_DELTA_MAX, THRESHOLD_DELTA_MIN, WINDOW_DELTA_MAX,
    WINDOW_DELTA_MIN,
};
use crate::playbook::PlaybookConfig;
use serde::Serialize;

pub const MAX_ACTIONS: usize = 20;

/// Exact message for a playbook with an out-of-range action count.
pub const ACTION_COUNT_ERROR: &str = "actions must contain 1-20 entries";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}

/// Validate a single action against the documented parameter bounds.
pub fn validate_action(action: &Action) -> ValidationReport {
    ValidationReport::from_errors(action_errors(action))
}

/// Validate a full playbook config: the 1-20 action count plus every
/// action's own bounds, with errors prefixed by action index.
pub fn validate_playbook_config(config: &PlaybookConfig) -> ValidationReport {
    let mut errors = Vec::new();
    if config.actions.is_empty() || config.actions.len() > MAX_ACTIONS {
        errors.push(ACTION_COUNT_ERROR.to_string());
    }
    for (index, action) in config.actions.iter().enumerate() {
        for message in action_errors(action) {
            errors.push(format!("action {index}: {message}"));
        }
    }
    ValidationReport::from_errors(errors)
}

fn action_errors(action: &Action) -> Vec<String> {
    let mut errors = Vec::new();
    match action {
        Action::AdjustRuleThreshold { rule_id, delta, .. } => {
            check_rule_id(rule_id, &mut errors);
            check_range(
                "delta",
                *delta,
                THRESHOLD_DELTA_MIN,
                THRESHOLD_DELTA_MAX,
                &mut errors,
            );
        }
        Action::DisableRule { rule_id } => {
            check_rule_id(rule_id, &mut errors);
        }
        Action::AdjustCorrelationWindow { window_minutes_delta } => {
            check_range(
                "window_minutes_delta",
                *window_minutes_delta,
                WINDOW_DELTA_MIN,
                WINDOW_DELTA_MAX,
                &mut errors,
            );
        }
        Action::IncreaseMinLinkCount { delta } => {
            check_range("delta", *delta, MIN_LINK_DELTA_MIN, MIN_LINK_DELTA_MAX, &mut errors);
        }
        Action::SuppressNotificationChannel { duration_minutes, .. } => {
            check_range(
                "duration_minutes",
                *duration_minutes,
                SUPPRESS_DURATION_MIN,
                SUPPRESS_DURATION_MAX,
                &mut errors,
            );
        }
    }
    errors
}

fn check_rule_id(rule_id: &str, errors: &mut Vec<String>) {
    if rule_id.trim().is_empty() {
        errors.push("rule_id must not be empty".to_string());
    }
}

fn check_range(field: &str, value: i64, min: i64, max: i64, errors: &mut Vec<String>) {
    if !(min..=max).contains(&value) {
        errors.push(format!("{field} must be between {min} and {max}, got {value}"));
    }
}
