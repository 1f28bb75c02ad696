//! # Runtime Adapter Constants
//!
//! Names, limits and timeouts shared by the sandbox translation layer and the
//! engine client. The naming constants define the on-the-wire pod name and
//! label layout understood by the engine, so changing any of them breaks
//! decoding of pods created by earlier builds.

use std::time::Duration;

// =============================================================================
// Runtime Identity
// =============================================================================

/// Runtime name reported to the agent.
pub const RUNTIME_NAME: &str = "hyper";

/// Oldest engine daemon version this adapter talks to.
pub const MINIMUM_ENGINE_VERSION: &str = "0.6.0";

// =============================================================================
// Timeouts
// =============================================================================

/// Bound on every engine call (connect and response read).
pub const ENGINE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(300);

/// Default engine endpoint.
pub const DEFAULT_ENGINE_ENDPOINT: &str = "unix:///var/run/hyper.sock";

// =============================================================================
// Time Conversion
// =============================================================================

/// Engine timestamps are seconds; the agent contract is nanoseconds.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// =============================================================================
// Sandbox Naming
// =============================================================================
//
// Pod names are `k8s_<name>_<namespace>_<uid>_<attempt>`. Fields are
// percent-escaped so a field may legally contain the separator.
// =============================================================================

/// Leading token of every sandbox pod name.
pub const SANDBOX_NAME_PREFIX: &str = "k8s";

/// Separator between sandbox name fields.
pub const SANDBOX_NAME_SEPARATOR: char = '_';

/// Number of fields in an encoded sandbox name, prefix included.
pub const SANDBOX_NAME_FIELDS: usize = 5;

// =============================================================================
// Label Layout
// =============================================================================

/// Engine label prefix marking a stored annotation.
pub const ANNOTATION_PREFIX: &str = "annotation.";

/// Engine label prefix escaping a label whose key collides with a reserved prefix.
pub const LABEL_ESCAPE_PREFIX: &str = "label.";

// =============================================================================
// Input Limits
// =============================================================================

/// Maximum size of a sandbox manifest or config file (1 MiB).
pub const MAX_MANIFEST_SIZE: usize = 1024 * 1024;

/// Maximum number of labels per sandbox.
pub const MAX_LABELS_PER_SANDBOX: usize = 64;

/// Maximum number of annotations per sandbox.
pub const MAX_ANNOTATIONS_PER_SANDBOX: usize = 64;

/// Maximum size of a single engine response line (16 MiB).
pub const MAX_RESPONSE_LINE: usize = 16 * 1024 * 1024;

// =============================================================================
// Runtime Conditions
// =============================================================================

/// Condition type: the engine daemon is reachable.
pub const RUNTIME_READY: &str = "RuntimeReady";

/// Condition type: pod networking is ready.
pub const NETWORK_READY: &str = "NetworkReady";

/// Reason attached to `RuntimeReady=false`.
pub const REASON_DAEMON_NOT_READY: &str = "HyperDaemonNotReady";
