//! Error types for the sandbox runtime adapter.

use crate::engine::EngineError;
use std::path::PathBuf;

/// Result type alias for sandbox runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while translating and driving sandbox operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Translation Errors
    // =========================================================================
    /// The sandbox config cannot be turned into an engine pod spec.
    #[error("failed to build pod spec for sandbox '{sandbox}': {reason}")]
    SpecBuild { sandbox: String, reason: String },

    /// An engine-reported pod name does not decode into sandbox metadata.
    #[error("invalid sandbox name format '{name}': {reason}")]
    InvalidNameFormat { name: String, reason: String },

    /// Manifest or other user-supplied input is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// An engine call failed. Carries the operation and target for attribution.
    #[error("{operation} failed for '{id}': {source}")]
    Engine {
        operation: &'static str,
        id: String,
        #[source]
        source: EngineError,
    },

    /// The engine daemon is older than the minimum supported version.
    #[error("engine version {found} is older than required {required}")]
    UnsupportedEngineVersion { found: String, required: String },

    // =========================================================================
    // Capability Errors
    // =========================================================================
    /// Operation deliberately not implemented by this runtime.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Runtime configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read a configuration or manifest file.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Wraps an engine error with the operation and target it belongs to.
    pub(crate) fn engine(operation: &'static str, id: impl Into<String>, source: EngineError) -> Self {
        Self::Engine {
            operation,
            id: id.into(),
            source,
        }
    }

    /// Returns true if the failure is a permanent capability gap.
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported(_))
    }
}
