//! # Engine Client Interface
//!
//! The sandbox runtime reaches the hyper pod engine only through the
//! [`EngineClient`] trait. The engine owns every pod record; this crate reads
//! them and issues lifecycle requests.
//!
//! ```text
//! ┌─────────────────────────────┐
//! │        HyperRuntime         │
//! │  run / stop / delete /      │
//! │  status / list              │
//! └──────────────┬──────────────┘
//!                │ Arc<dyn EngineClient>
//!                ▼
//! ┌─────────────────────────────┐        JSON lines         ┌──────────┐
//! │        HyperClient          │ ────────────────────────▶ │  hyperd  │
//! │  unix:// or tcp:// endpoint │ ◀──────────────────────── │          │
//! └─────────────────────────────┘   one connection/request  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: Request/response wire types
//! - [`client`]: Async socket client implementing [`EngineClient`]

pub mod client;
pub mod protocol;

pub use client::{EngineEndpoint, HyperClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Engine Data Types
// =============================================================================

/// Engine-facing pod specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPod {
    /// Encoded sandbox name.
    pub name: String,
    /// Hostname override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Merged label map (labels plus prefixed annotations).
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// The engine's view of one pod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRecord {
    /// Engine pod ID.
    pub pod_id: String,
    /// Encoded sandbox name.
    pub pod_name: String,
    /// Engine-native phase string.
    pub phase: String,
    /// Merged label map.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Creation time in seconds since the epoch.
    pub created_at: i64,
    /// Pod IP addresses, primary first.
    #[serde(default)]
    pub pod_ip: Vec<String>,
}

/// Engine daemon version information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineVersion {
    /// Daemon version.
    pub version: String,
    /// Daemon API version.
    pub api_version: String,
}

/// Outcome reported by the engine for a stop request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopOutcome {
    /// Engine result code.
    pub code: i32,
    /// Engine-supplied cause text.
    pub cause: String,
}

// =============================================================================
// Engine Errors
// =============================================================================

/// Transport and engine-side failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Connection failed.
    #[error("failed to connect to engine at {endpoint}: {source}")]
    ConnectionFailed {
        /// Endpoint URI.
        endpoint: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The engine rejected the request.
    #[error("engine error (code {code}): {cause}")]
    Remote {
        /// Engine result code.
        code: i32,
        /// Engine-supplied cause.
        cause: String,
    },

    /// Unexpected response.
    #[error("unexpected response: expected {expected}, got {got}")]
    UnexpectedResponse {
        /// Expected response type.
        expected: String,
        /// Actual response type.
        got: String,
    },
}

impl EngineError {
    /// Returns the engine's code and cause when the engine supplied them.
    #[must_use]
    pub fn code_and_cause(&self) -> Option<(i32, &str)> {
        match self {
            Self::Remote { code, cause } => Some((*code, cause.as_str())),
            _ => None,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Engine Client Trait
// =============================================================================

/// Operations the sandbox runtime needs from the pod engine.
///
/// Implementations must be safe for concurrent use; the runtime shares one
/// handle between all in-flight operations and never serializes calls.
/// Every call should be bounded by a timeout and fail with
/// [`EngineError::Timeout`] when it expires.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Returns the daemon version and API version.
    async fn get_version(&self) -> EngineResult<EngineVersion>;

    /// Creates a pod and returns its engine ID.
    async fn create_pod(&self, spec: &UserPod) -> EngineResult<String>;

    /// Starts a created pod.
    async fn start_pod(&self, pod_id: &str) -> EngineResult<()>;

    /// Gracefully stops a pod.
    async fn stop_pod(&self, pod_id: &str) -> EngineResult<StopOutcome>;

    /// Removes a pod.
    async fn remove_pod(&self, pod_id: &str) -> EngineResult<()>;

    /// Returns the record for one pod.
    async fn get_pod_info(&self, pod_id: &str) -> EngineResult<EngineRecord>;

    /// Returns records for all pods.
    async fn get_pod_list(&self) -> EngineResult<Vec<EngineRecord>>;
}
