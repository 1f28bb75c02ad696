//! Sandbox runtime - the agent-facing sandbox lifecycle API.
//!
//! `HyperRuntime` drives sandboxes hosted by the hyper pod engine:
//! - `run_pod_sandbox`: Create and start a sandbox pod
//! - `stop_pod_sandbox`: Gracefully stop it
//! - `delete_pod_sandbox`: Remove it
//! - `pod_sandbox_status`: Translate one pod record
//! - `list_pod_sandbox`: Translate, filter and order all pod records
//!
//! # Sandbox Lifecycle
//!
//! ```text
//!   ┌────────┐  create  ┌─────────┐  start  ┌─────────┐  stop  ┌─────────┐
//!   │ Absent │ ───────▶ │ Created │ ──────▶ │ Running │ ─────▶ │ Stopped │
//!   └────────┘          └────┬────┘         └─────────┘        └────┬────┘
//!        ▲                   │ start failed: remove (best effort)   │
//!        └───────────────────┴──────────────────────────────────────┘
//!                                    remove
//! ```
//!
//! The runtime keeps no sandbox state. Each query re-reads the engine and the
//! state above is inferred from the pod phase. The only shared resource is the
//! engine client handle, which is set at construction and never mutated, so a
//! `HyperRuntime` can serve concurrent callers without locking.
//!
//! # Logging
//!
//! The runtime owns a `tracing::Span` and every event it emits is parented to
//! it. Callers scope the runtime's diagnostics by supplying their own span with
//! [`HyperRuntime::with_span`].

use crate::config::RuntimeConfig;
use crate::constants::{
    MINIMUM_ENGINE_VERSION, NETWORK_READY, REASON_DAEMON_NOT_READY, RUNTIME_NAME, RUNTIME_READY,
};
use crate::engine::{EngineClient, HyperClient};
use crate::error::{Error, Result};
use crate::sandbox::{
    SandboxConfig, SandboxFilter, SandboxStatus, SandboxSummary, build_user_pod,
    sort_by_created_at,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Runtime Info Types
// =============================================================================

/// Runtime name and versions reported to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    /// Runtime name (`hyper`).
    pub runtime_name: String,
    /// Engine daemon version.
    pub runtime_version: String,
    /// Engine API version.
    pub runtime_api_version: String,
}

/// One runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeCondition {
    /// Condition type (`RuntimeReady`, `NetworkReady`).
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Whether the condition holds.
    pub status: bool,
    /// Machine-readable reason when the condition does not hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message when the condition does not hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuntimeCondition {
    fn ready(condition_type: &str) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status: true,
            reason: None,
            message: None,
        }
    }
}

/// Runtime health as reported to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    /// All conditions.
    pub conditions: Vec<RuntimeCondition>,
}

impl RuntimeStatus {
    /// Looks up a condition by type.
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&RuntimeCondition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}

/// Streaming operations a runtime may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingCapability {
    /// Synchronous command execution.
    ExecSync,
    /// Interactive command execution.
    Exec,
    /// Attach to a running container.
    Attach,
    /// Port forwarding into a sandbox.
    PortForward,
}

impl std::fmt::Display for StreamingCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExecSync => write!(f, "exec_sync"),
            Self::Exec => write!(f, "exec"),
            Self::Attach => write!(f, "attach"),
            Self::PortForward => write!(f, "port_forward"),
        }
    }
}

/// Streaming operations supported by this runtime.
const SUPPORTED_STREAMING: &[StreamingCapability] = &[];

// =============================================================================
// Hyper Runtime
// =============================================================================

/// Sandbox lifecycle manager backed by the hyper pod engine.
pub struct HyperRuntime {
    client: Arc<dyn EngineClient>,
    span: tracing::Span,
}

impl HyperRuntime {
    /// Creates a runtime over an existing engine client.
    #[must_use]
    pub fn new(client: Arc<dyn EngineClient>) -> Self {
        Self {
            client,
            span: tracing::info_span!("hyper_runtime"),
        }
    }

    /// Replaces the span all runtime events are recorded under.
    #[must_use]
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// Connects to the engine described by `config` and checks its version.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for a malformed endpoint
    /// - `Engine` if the version query fails
    /// - `UnsupportedEngineVersion` if the daemon is too old
    pub async fn connect(config: &RuntimeConfig) -> Result<Self> {
        let client = HyperClient::new(&config.endpoint)?.with_timeout(config.connection_timeout());
        let span = tracing::info_span!("hyper_runtime", endpoint = %config.endpoint);
        let runtime = Self::new(Arc::new(client)).with_span(span);

        let version = runtime.version().await?;
        check_engine_version(&version.runtime_version)?;

        tracing::info!(
            parent: &runtime.span,
            version = %version.runtime_version,
            api_version = %version.runtime_api_version,
            streaming = ?runtime.capabilities(),
            "Connected to hyper engine"
        );
        Ok(runtime)
    }

    /// Returns the streaming operations this runtime supports.
    ///
    /// Callers should consult this instead of probing the streaming calls.
    #[must_use]
    pub fn capabilities(&self) -> &'static [StreamingCapability] {
        SUPPORTED_STREAMING
    }

    // =========================================================================
    // Runtime Info
    // =========================================================================

    /// Returns the runtime name, engine version and engine API version.
    ///
    /// # Errors
    ///
    /// `Engine` if the version query fails.
    pub async fn version(&self) -> Result<RuntimeVersion> {
        let version = self.client.get_version().await.map_err(|e| {
            tracing::error!(parent: &self.span, error = %e, "Get hyper version failed");
            Error::engine("get_version", RUNTIME_NAME, e)
        })?;

        Ok(RuntimeVersion {
            runtime_name: RUNTIME_NAME.to_string(),
            runtime_version: version.version,
            runtime_api_version: version.api_version,
        })
    }

    /// Returns runtime health. Never fails: an unreachable engine is reported
    /// as `RuntimeReady=false`.
    pub async fn status(&self) -> RuntimeStatus {
        let mut runtime_ready = RuntimeCondition::ready(RUNTIME_READY);
        // No network plugin integration; network is always reported ready.
        let network_ready = RuntimeCondition::ready(NETWORK_READY);

        if let Err(e) = self.client.get_version().await {
            tracing::warn!(parent: &self.span, error = %e, "Hyper daemon not ready");
            runtime_ready.status = false;
            runtime_ready.reason = Some(REASON_DAEMON_NOT_READY.to_string());
            runtime_ready.message = Some(format!("hyper: failed to get hyper version: {e}"));
        }

        RuntimeStatus {
            conditions: vec![runtime_ready, network_ready],
        }
    }

    /// Accepts a runtime config update. Nothing is configurable yet.
    pub fn update_runtime_config(&self, pod_cidr: Option<&str>) -> Result<()> {
        tracing::debug!(parent: &self.span, pod_cidr = ?pod_cidr, "Ignoring runtime config update");
        Ok(())
    }

    // =========================================================================
    // Sandbox Lifecycle
    // =========================================================================

    /// Creates and starts a sandbox, returning its engine pod ID.
    ///
    /// If the pod is created but fails to start, one removal of the created
    /// pod is attempted. A failed removal is logged and the start error is
    /// still what the caller receives.
    ///
    /// # Errors
    ///
    /// - `SpecBuild` before any engine call
    /// - `Engine` from `create_pod` or `start_pod`
    pub async fn run_pod_sandbox(&self, config: &SandboxConfig) -> Result<String> {
        let user_pod = build_user_pod(config).inspect_err(|e| {
            tracing::error!(parent: &self.span, sandbox = %config.metadata, error = %e, "Build UserPod for sandbox failed");
        })?;

        let pod_id = self.client.create_pod(&user_pod).await.map_err(|e| {
            tracing::error!(parent: &self.span, sandbox = %config.metadata, error = %e, "Create pod for sandbox failed");
            Error::engine("create_pod", user_pod.name.as_str(), e)
        })?;

        if let Err(e) = self.client.start_pod(&pod_id).await {
            tracing::error!(parent: &self.span, pod = %pod_id, error = %e, "Start pod failed");
            if let Err(remove_err) = self.client.remove_pod(&pod_id).await {
                tracing::warn!(
                    parent: &self.span,
                    pod = %pod_id,
                    error = %remove_err,
                    "Remove pod after failed start failed"
                );
            }
            return Err(Error::engine("start_pod", pod_id, e));
        }

        tracing::info!(parent: &self.span, pod = %pod_id, sandbox = %config.metadata, "Sandbox running");
        Ok(pod_id)
    }

    /// Stops a sandbox.
    ///
    /// # Errors
    ///
    /// `Engine` carrying the engine's code and cause. Not retried.
    pub async fn stop_pod_sandbox(&self, pod_id: &str) -> Result<()> {
        match self.client.stop_pod(pod_id).await {
            Ok(outcome) => {
                tracing::debug!(parent: &self.span, pod = %pod_id, code = outcome.code, cause = %outcome.cause, "Pod stopped");
                Ok(())
            }
            Err(e) => {
                let (code, cause) = e.code_and_cause().unwrap_or((-1, ""));
                tracing::error!(
                    parent: &self.span,
                    pod = %pod_id,
                    code,
                    cause,
                    error = %e,
                    "Stop pod failed"
                );
                Err(Error::engine("stop_pod", pod_id, e))
            }
        }
    }

    /// Deletes a sandbox.
    ///
    /// Errors for pods that are already gone are forwarded as the engine
    /// reports them.
    ///
    /// # Errors
    ///
    /// `Engine` from `remove_pod`.
    pub async fn delete_pod_sandbox(&self, pod_id: &str) -> Result<()> {
        self.client.remove_pod(pod_id).await.map_err(|e| {
            tracing::error!(parent: &self.span, pod = %pod_id, error = %e, "Remove pod failed");
            Error::engine("remove_pod", pod_id, e)
        })
    }

    /// Returns the status of one sandbox.
    ///
    /// # Errors
    ///
    /// - `Engine` from `get_pod_info`
    /// - `InvalidNameFormat` if the pod name does not decode
    pub async fn pod_sandbox_status(&self, pod_id: &str) -> Result<SandboxStatus> {
        let record = self.client.get_pod_info(pod_id).await.map_err(|e| {
            tracing::error!(parent: &self.span, pod = %pod_id, error = %e, "GetPodInfo failed");
            Error::engine("get_pod_info", pod_id, e)
        })?;

        SandboxStatus::from_record(&record).inspect_err(|e| {
            tracing::error!(parent: &self.span, pod = %pod_id, name = %record.pod_name, error = %e, "Parse sandbox name failed");
        })
    }

    /// Lists sandboxes matching `filter`, oldest first.
    ///
    /// One undecodable pod name fails the whole listing; partial results are
    /// never returned.
    ///
    /// # Errors
    ///
    /// - `Engine` from `get_pod_list`
    /// - `InvalidNameFormat` for any pod whose name does not decode
    pub async fn list_pod_sandbox(
        &self,
        filter: Option<&SandboxFilter>,
    ) -> Result<Vec<SandboxSummary>> {
        let records = self.client.get_pod_list().await.map_err(|e| {
            tracing::error!(parent: &self.span, error = %e, "GetPodList failed");
            Error::engine("get_pod_list", "*", e)
        })?;

        let mut items = Vec::with_capacity(records.len());
        for record in &records {
            let summary = SandboxSummary::from_record(record).inspect_err(|e| {
                tracing::error!(parent: &self.span, pod = %record.pod_id, name = %record.pod_name, error = %e, "Parse sandbox name failed");
            })?;

            if filter.is_none_or(|f| f.matches(&summary)) {
                items.push(summary);
            }
        }

        sort_by_created_at(&mut items);
        Ok(items)
    }

    // =========================================================================
    // Streaming (not supported)
    // =========================================================================

    /// Runs a command in a container synchronously.
    pub async fn exec_sync(&self, container_id: &str, _command: &[String]) -> Result<()> {
        self.not_supported(StreamingCapability::ExecSync, container_id)
    }

    /// Executes a command in a container with streaming I/O.
    pub async fn exec(&self, container_id: &str, _command: &[String], _tty: bool) -> Result<()> {
        self.not_supported(StreamingCapability::Exec, container_id)
    }

    /// Attaches to a running container.
    pub async fn attach(&self, container_id: &str) -> Result<()> {
        self.not_supported(StreamingCapability::Attach, container_id)
    }

    /// Forwards ports into a sandbox.
    pub async fn port_forward(&self, pod_id: &str, _ports: &[u16]) -> Result<()> {
        self.not_supported(StreamingCapability::PortForward, pod_id)
    }

    fn not_supported(&self, capability: StreamingCapability, id: &str) -> Result<()> {
        tracing::debug!(parent: &self.span, %capability, id, "Streaming operation not supported");
        Err(Error::NotSupported(format!(
            "{capability} is not implemented by the {RUNTIME_NAME} runtime"
        )))
    }
}

/// Checks that an engine version meets [`MINIMUM_ENGINE_VERSION`].
///
/// # Errors
///
/// `UnsupportedEngineVersion` if the version is older or unparseable.
pub fn check_engine_version(version: &str) -> Result<()> {
    let unsupported = || Error::UnsupportedEngineVersion {
        found: version.to_string(),
        required: MINIMUM_ENGINE_VERSION.to_string(),
    };

    let found = parse_lenient(version).ok_or_else(unsupported)?;
    let required = semver::Version::parse(MINIMUM_ENGINE_VERSION).map_err(|_| unsupported())?;

    if found < required {
        return Err(unsupported());
    }
    Ok(())
}

/// Parses `v0.8`, `0.8` or `0.8.1-rc1`, filling missing components with zero.
fn parse_lenient(version: &str) -> Option<semver::Version> {
    let version = version.trim().trim_start_matches('v');
    if let Ok(parsed) = semver::Version::parse(version) {
        return Some(parsed);
    }

    let (core, pre) = match version.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (version, None),
    };
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() {
        return None;
    }

    let mut parsed = semver::Version::new(major, minor, 0);
    if let Some(pre) = pre {
        parsed.pre = semver::Prerelease::new(pre).ok()?;
    }
    Some(parsed)
}
