//! Sandbox state types.
//!
//! This module defines the agent-facing sandbox types and the translation of
//! engine pod records into them:
//! - `SandboxMetadata`: Sandbox identity, recovered from the pod name
//! - `EnginePhase`: Engine-native pod lifecycle phase
//! - `SandboxState`: Agent-facing readiness (two-valued)
//! - `SandboxStatus`: Full status for a single sandbox
//! - `SandboxSummary`: Lightweight entry for listing

use super::{labels, name};
use crate::constants::NANOS_PER_SECOND;
use crate::engine::EngineRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Sandbox Metadata
// =============================================================================

/// Identity of one sandbox instance.
///
/// `attempt` distinguishes successive recreations of the same logical sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SandboxMetadata {
    /// Pod name.
    pub name: String,
    /// Pod namespace.
    pub namespace: String,
    /// Pod UID assigned by the cluster.
    pub uid: String,
    /// Restart attempt counter.
    #[serde(default)]
    pub attempt: u32,
}

impl SandboxMetadata {
    /// Creates sandbox metadata.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        uid: impl Into<String>,
        attempt: u32,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            attempt,
        }
    }
}

impl std::fmt::Display for SandboxMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({}, attempt {})", self.namespace, self.name, self.uid, self.attempt)
    }
}

// =============================================================================
// Engine Phase
// =============================================================================

/// Engine-native pod phase.
///
/// The engine reports phases as free-form strings; the documented ones are
/// parsed into variants and anything else is kept as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePhase {
    /// Pod accepted, not yet prepared.
    Pending,
    /// Pod resources being prepared.
    Preparing,
    /// Pod is running.
    Running,
    /// Pod is paused.
    Paused,
    /// Pod finished successfully.
    Succeeded,
    /// Pod finished with failure.
    Failed,
    /// Phase string not known to this adapter.
    Unknown(String),
}

impl EnginePhase {
    /// Parses an engine phase string (case-insensitive).
    #[must_use]
    pub fn parse(phase: &str) -> Self {
        match phase.to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "preparing" => Self::Preparing,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Unknown(phase.to_string()),
        }
    }

    /// Maps this phase onto sandbox readiness.
    #[must_use]
    pub fn sandbox_state(&self) -> SandboxState {
        match self {
            Self::Running => SandboxState::Ready,
            Self::Pending
            | Self::Preparing
            | Self::Paused
            | Self::Succeeded
            | Self::Failed
            | Self::Unknown(_) => SandboxState::NotReady,
        }
    }
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Preparing => write!(f, "preparing"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

// =============================================================================
// Sandbox State
// =============================================================================

/// Agent-facing sandbox readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SandboxState {
    /// Sandbox is running and usable.
    Ready,
    /// Sandbox exists but is not (or no longer) usable.
    NotReady,
}

impl std::fmt::Display for SandboxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "SANDBOX_READY"),
            Self::NotReady => write!(f, "SANDBOX_NOTREADY"),
        }
    }
}

impl std::str::FromStr for SandboxState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        let s = s.strip_prefix("sandbox_").unwrap_or(&s);
        match s {
            "ready" => Ok(Self::Ready),
            "notready" | "not_ready" | "not-ready" => Ok(Self::NotReady),
            other => Err(format!("unknown sandbox state: {other}")),
        }
    }
}

/// Maps an engine phase string to sandbox readiness.
///
/// Total: unrecognized phases map to `NotReady` so that listing never fails on
/// a transient phase this adapter does not know about.
#[must_use]
pub fn map_phase(phase: &str) -> SandboxState {
    EnginePhase::parse(phase).sandbox_state()
}

/// Converts engine seconds to agent nanoseconds.
///
/// Exact for every timestamp representable in i64 nanoseconds; saturates
/// outside that range.
#[must_use]
pub fn seconds_to_nanos(seconds: i64) -> i64 {
    seconds.saturating_mul(NANOS_PER_SECOND)
}

// =============================================================================
// Sandbox Status
// =============================================================================

/// Detailed status of one sandbox. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxStatus {
    /// Engine pod ID.
    pub id: String,
    /// Sandbox identity.
    pub metadata: SandboxMetadata,
    /// Readiness.
    pub state: SandboxState,
    /// First pod IP, if the engine reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Creation time in nanoseconds since the epoch.
    pub created_at: i64,
    /// Agent labels.
    pub labels: HashMap<String, String>,
    /// Agent annotations.
    pub annotations: HashMap<String, String>,
}

impl SandboxStatus {
    /// Translates an engine record into sandbox status.
    ///
    /// # Errors
    ///
    /// `InvalidNameFormat` if the pod name does not decode; a sandbox whose
    /// identity cannot be recovered is not reported.
    pub fn from_record(record: &EngineRecord) -> Result<Self> {
        let metadata = name::decode(&record.pod_name)?;
        let (labels, annotations) = labels::split(&record.labels);

        Ok(Self {
            id: record.pod_id.clone(),
            metadata,
            state: map_phase(&record.phase),
            ip: record.pod_ip.first().cloned(),
            created_at: seconds_to_nanos(record.created_at),
            labels,
            annotations,
        })
    }

    /// Returns the creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at_utc(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_nanos(self.created_at)
    }
}

// =============================================================================
// Sandbox Summary
// =============================================================================

/// Lightweight sandbox information for listing (no annotations).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxSummary {
    /// Engine pod ID.
    pub id: String,
    /// Sandbox identity.
    pub metadata: SandboxMetadata,
    /// Readiness.
    pub state: SandboxState,
    /// Creation time in nanoseconds since the epoch.
    pub created_at: i64,
    /// Agent labels.
    pub labels: HashMap<String, String>,
}

impl SandboxSummary {
    /// Translates an engine record into a list entry.
    ///
    /// # Errors
    ///
    /// `InvalidNameFormat` if the pod name does not decode.
    pub fn from_record(record: &EngineRecord) -> Result<Self> {
        let metadata = name::decode(&record.pod_name)?;
        let (labels, _) = labels::split(&record.labels);

        Ok(Self {
            id: record.pod_id.clone(),
            metadata,
            state: map_phase(&record.phase),
            created_at: seconds_to_nanos(record.created_at),
            labels,
        })
    }

    /// Returns the creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at_utc(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_nanos(self.created_at)
    }
}

impl From<SandboxStatus> for SandboxSummary {
    fn from(status: SandboxStatus) -> Self {
        Self {
            id: status.id,
            metadata: status.metadata,
            state: status.state,
            created_at: status.created_at,
            labels: status.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documented_phases() {
        assert_eq!(map_phase("running"), SandboxState::Ready);
        assert_eq!(map_phase("Running"), SandboxState::Ready);
        for phase in ["pending", "preparing", "paused", "succeeded", "failed"] {
            assert_eq!(map_phase(phase), SandboxState::NotReady, "phase {phase}");
        }
    }

    #[test]
    fn test_unknown_phase_is_not_ready() {
        assert_eq!(map_phase(""), SandboxState::NotReady);
        assert_eq!(map_phase("migrating"), SandboxState::NotReady);
        assert_eq!(
            EnginePhase::parse("migrating"),
            EnginePhase::Unknown("migrating".to_string())
        );
    }

    #[test]
    fn test_seconds_to_nanos() {
        assert_eq!(seconds_to_nanos(0), 0);
        assert_eq!(seconds_to_nanos(1000), 1_000_000_000_000);
        assert_eq!(seconds_to_nanos(1_700_000_000), 1_700_000_000_000_000_000);
        assert_eq!(seconds_to_nanos(-3), -3_000_000_000);
        assert_eq!(seconds_to_nanos(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_status_from_record() {
        let record = EngineRecord {
            pod_id: "pod-1".to_string(),
            pod_name: "k8s_web_default_u1_0".to_string(),
            phase: "running".to_string(),
            labels: HashMap::new(),
            created_at: 1_700_000_000,
            pod_ip: Vec::new(),
        };
        let status = SandboxStatus::from_record(&record).unwrap();
        assert_eq!(status.created_at_utc().timestamp(), 1_700_000_000);
        assert!(status.ip.is_none());

        let summary = SandboxSummary::from(status.clone());
        assert_eq!(summary.created_at, status.created_at);
        assert_eq!(summary, SandboxSummary::from_record(&record).unwrap());
    }

    #[test]
    fn test_state_from_str() {
        assert_eq!("ready".parse::<SandboxState>(), Ok(SandboxState::Ready));
        assert_eq!("SANDBOX_NOTREADY".parse::<SandboxState>(), Ok(SandboxState::NotReady));
        assert_eq!("not_ready".parse::<SandboxState>(), Ok(SandboxState::NotReady));
        assert!("stopped".parse::<SandboxState>().is_err());
    }
}
