//! Playbook records: named, tenant-owned remediation action lists.
//!
//! Playbooks are created and edited by users through the CRUD surface; the
//! simulator only ever reads them. The config is re-validated on every read
//! that feeds a simulation.

use crate::action::Action;
use crate::types::{PlaybookId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The payload of a playbook: what to hypothetically apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookConfig {
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playbook {
    pub playbook_id: PlaybookId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_active: bool,
    pub config: PlaybookConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a playbook.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybookDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub config: PlaybookConfig,
}

/// Partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaybookPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub config: Option<PlaybookConfig>,
}
