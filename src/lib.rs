//! # podbridge
//!
//! **Sandbox Lifecycle Adapter for the hyper Pod Engine**
//!
//! This crate exposes the sandbox operations a cluster node agent expects
//! (run, stop, delete, status, list) and implements them on top of the hyper
//! pod engine, which hosts each sandbox as a lightweight-VM pod. It keeps no
//! sandbox state of its own: every answer is derived from the engine's pod
//! records at the time of the query.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            node agent                               │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                │ SandboxConfig / SandboxFilter
//! ┌──────────────────────────────▼──────────────────────────────────────┐
//! │                           podbridge                                 │
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                     HyperRuntime                            │    │
//! │  │  run_pod_sandbox → stop_pod_sandbox → delete_pod_sandbox    │    │
//! │  │          pod_sandbox_status │ list_pod_sandbox              │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │                 Sandbox Translation                       │      │
//! │  │  name codec │ label/annotation layout │ phase mapping     │      │
//! │  │  filtering  │ ordering by creation time                   │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! │                              │ Arc<dyn EngineClient>                │
//! │  ┌───────────────────────────▼───────────────────────────────┐      │
//! │  │           HyperClient (JSON lines, unix / tcp)            │      │
//! │  └───────────────────────────────────────────────────────────┘      │
//! └──────────────────────────────┬──────────────────────────────────────┘
//!                                ▼
//!                             hyperd
//! ```
//!
//! # Naming
//!
//! Sandbox identity is stored in the engine pod name as
//! `k8s_<name>_<namespace>_<uid>_<attempt>`. Each field is percent-escaped so
//! it may contain the `_` separator, and decoding is the exact inverse of
//! encoding. Names that do not decode are rejected rather than guessed at.
//!
//! # Labels and Annotations
//!
//! The engine has a single label map per pod. Annotations are stored under
//! the `annotation.` prefix and labels that would collide with a reserved
//! prefix are stored under `label.`, so both maps are recovered exactly.
//!
//! # Example
//!
//! ```rust,ignore
//! use podbridge::{HyperRuntime, RuntimeConfig, SandboxConfig, SandboxMetadata};
//!
//! #[tokio::main]
//! async fn main() -> podbridge::Result<()> {
//!     let config = RuntimeConfig::default().apply_env()?;
//!     let runtime = HyperRuntime::connect(&config).await?;
//!
//!     let sandbox = SandboxConfig::new(SandboxMetadata::new("web", "default", "uid-1", 0))
//!         .with_label("app", "web");
//!     let id = runtime.run_pod_sandbox(&sandbox).await?;
//!
//!     let status = runtime.pod_sandbox_status(&id).await?;
//!     println!("{} is {}", status.metadata, status.state);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod sandbox;

// Re-exports
pub use config::RuntimeConfig;
pub use constants::*;
pub use engine::{EngineClient, EngineError, EngineRecord, HyperClient, UserPod};
pub use error::{Error, Result};
pub use runtime::{
    HyperRuntime, RuntimeCondition, RuntimeStatus, RuntimeVersion, StreamingCapability,
};
pub use sandbox::{
    SandboxConfig, SandboxFilter, SandboxMetadata, SandboxState, SandboxStatus, SandboxSummary,
};
