//! Sandbox list filtering and ordering.

use super::{SandboxState, SandboxSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Predicate for `list_pod_sandbox`.
///
/// Every clause is optional; present clauses are ANDed and an absent clause
/// imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxFilter {
    /// Match on engine pod ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Match on readiness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SandboxState>,
    /// Every pair must be present and equal in the sandbox labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<HashMap<String, String>>,
}

impl SandboxFilter {
    /// Creates an empty filter that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one pod ID.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Restricts to one readiness state.
    #[must_use]
    pub fn with_state(mut self, state: SandboxState) -> Self {
        self.state = Some(state);
        self
    }

    /// Adds a required label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_selector
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns true if the sandbox satisfies every present clause.
    #[must_use]
    pub fn matches(&self, sandbox: &SandboxSummary) -> bool {
        if let Some(id) = &self.id
            && sandbox.id != *id
        {
            return false;
        }

        if let Some(state) = self.state
            && sandbox.state != state
        {
            return false;
        }

        if let Some(selector) = &self.label_selector
            && !selector
                .iter()
                .all(|(k, v)| sandbox.labels.get(k) == Some(v))
        {
            return false;
        }

        true
    }
}

/// Orders sandboxes by creation time, oldest first.
///
/// Stable: sandboxes created in the same second keep the order the engine
/// listed them in, so repeated listings are consistent.
pub fn sort_by_created_at(sandboxes: &mut [SandboxSummary]) {
    sandboxes.sort_by_key(|s| s.created_at);
}
