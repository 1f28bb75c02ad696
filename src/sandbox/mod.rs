//! # Sandbox Translation Layer
//!
//! Pure translation between the agent's sandbox model and the engine's pod
//! model. Nothing here talks to the engine or keeps state between calls.
//!
//! ```text
//!   agent side                          engine side
//!   ──────────                          ───────────
//!   SandboxMetadata ──── name::encode ───▶ pod name  "k8s_web_default_u1_0"
//!                   ◀─── name::decode ────
//!   labels        ┐
//!                 ├─── labels::merge ───▶ pod labels {"app": "web",
//!   annotations   ┘◀── labels::split ────             "annotation.owner": "ops"}
//!   SandboxState  ◀─── state::map_phase ─ phase "running"
//! ```
//!
//! - [`name`]: sandbox identity codec
//! - [`state`]: phase mapping and agent-facing status types
//! - [`labels`]: label / annotation partitioning
//! - [`filter`]: list predicates and ordering
//! - [`spec`]: sandbox config parsing and engine pod spec building

pub mod filter;
pub mod labels;
pub mod name;
pub mod spec;
pub mod state;

pub use filter::{SandboxFilter, sort_by_created_at};
pub use spec::{SandboxConfig, build_user_pod};
pub use state::{EnginePhase, SandboxMetadata, SandboxState, SandboxStatus, SandboxSummary, map_phase};
