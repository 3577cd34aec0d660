//! Engine configuration.
//!
//! Everything has a sensible default; a JSON file can override any subset
//! of fields.

use crate::error::SimResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Trailing window used when a run request does not name one.
    pub default_window_days: u32,
    /// Upper bound on window_days accepted from clients.
    pub max_window_days: u32,
    /// Wall-clock budget for the baseline read, in seconds.
    pub baseline_timeout_secs: u64,
    /// Runs stuck in `running` longer than this are swept to `failed`.
    pub stale_run_ceiling_secs: i64,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
            max_window_days: 365,
            baseline_timeout_secs: 30,
            stale_run_ceiling_secs: 300,
            default_page_limit: 50,
            max_page_limit: 200,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. Fields not present fall back to defaults.
    pub fn from_file(path: &str) -> SimResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {path}: {e}"))?;
        Ok(serde_json::from_str(&raw)?)
    }
}
