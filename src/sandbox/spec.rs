//! Sandbox configuration and engine pod spec building.
//!
//! `SandboxConfig` is the agent's request to run a sandbox. It can be built
//! directly or parsed from a Kubernetes-style manifest:
//!
//! ```yaml
//! metadata:
//!   name: web
//!   namespace: default
//!   uid: 5f1c...
//!   attempt: 0
//!   labels: { app: web }
//!   annotations: { owner: ops }
//! spec:
//!   hostname: web-0
//! ```

use super::{SandboxMetadata, labels, name};
use crate::constants::{MAX_ANNOTATIONS_PER_SANDBOX, MAX_LABELS_PER_SANDBOX, MAX_MANIFEST_SIZE};
use crate::engine::UserPod;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Sandbox Config
// =============================================================================

/// Agent request to create and start a sandbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Sandbox identity.
    pub metadata: SandboxMetadata,
    /// Agent labels.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Agent annotations.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Hostname override for the pod.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl SandboxConfig {
    /// Creates a config with no labels or annotations.
    #[must_use]
    pub fn new(metadata: SandboxMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Sets the hostname.
    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Parses a sandbox config from a YAML manifest.
    ///
    /// Identity fields that are absent are left empty and rejected later by
    /// [`build_user_pod`].
    ///
    /// # Errors
    ///
    /// - Size exceeds `MAX_MANIFEST_SIZE`
    /// - YAML parsing fails
    /// - Wrong value types or too many labels/annotations
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        if yaml.len() > MAX_MANIFEST_SIZE {
            return Err(Error::InvalidInput(format!(
                "manifest size {} exceeds limit of {}",
                yaml.len(),
                MAX_MANIFEST_SIZE
            )));
        }

        let doc: serde_yaml::Value =
            serde_yaml::from_slice(yaml).map_err(|e| Error::InvalidInput(e.to_string()))?;

        Self::from_value(&doc)
    }

    /// Parses a sandbox config from a `serde_yaml::Value`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for wrong value types, a negative or oversized attempt,
    /// or too many labels/annotations.
    pub fn from_value(doc: &serde_yaml::Value) -> Result<Self> {
        let metadata = doc.get("metadata");

        let string_field = |field: &str| -> Result<String> {
            match metadata.and_then(|m| m.get(field)) {
                None => Ok(String::new()),
                Some(v) => v.as_str().map(String::from).ok_or_else(|| {
                    Error::InvalidInput(format!("metadata.{field} must be a string"))
                }),
            }
        };

        let name = string_field("name")?;
        let uid = string_field("uid")?;
        let namespace = match string_field("namespace")? {
            ns if ns.is_empty() => "default".to_string(),
            ns => ns,
        };

        let attempt = match metadata.and_then(|m| m.get("attempt")) {
            None => 0,
            Some(v) => v
                .as_u64()
                .and_then(|a| u32::try_from(a).ok())
                .ok_or_else(|| {
                    Error::InvalidInput("metadata.attempt must be a non-negative integer".into())
                })?,
        };

        let labels = parse_string_map(
            metadata.and_then(|m| m.get("labels")),
            "label",
            MAX_LABELS_PER_SANDBOX,
        )?;

        let annotations = parse_string_map(
            metadata.and_then(|m| m.get("annotations")),
            "annotation",
            MAX_ANNOTATIONS_PER_SANDBOX,
        )?;

        let hostname = doc
            .get("spec")
            .and_then(|s| s.get("hostname"))
            .and_then(|h| h.as_str())
            .map(String::from);

        Ok(Self {
            metadata: SandboxMetadata {
                name,
                namespace,
                uid,
                attempt,
            },
            labels,
            annotations,
            hostname,
        })
    }
}

fn parse_string_map(
    value: Option<&serde_yaml::Value>,
    kind: &str,
    max_count: usize,
) -> Result<HashMap<String, String>> {
    let Some(mapping) = value.and_then(|v| v.as_mapping()) else {
        return Ok(HashMap::new());
    };

    if mapping.len() > max_count {
        return Err(Error::InvalidInput(format!(
            "too many {}s: {} (max {})",
            kind,
            mapping.len(),
            max_count
        )));
    }

    let mut result = HashMap::new();
    for (k, v) in mapping.iter() {
        let key = k
            .as_str()
            .ok_or_else(|| Error::InvalidInput(format!("{} key must be a string", kind)))?;
        let val = v
            .as_str()
            .ok_or_else(|| Error::InvalidInput(format!("{} value must be a string", kind)))?;
        result.insert(key.to_string(), val.to_string());
    }
    Ok(result)
}

// =============================================================================
// Engine Pod Spec
// =============================================================================

/// Builds the engine-facing pod spec for a sandbox config.
///
/// # Errors
///
/// `SpecBuild` when identity fields are missing or label/annotation limits
/// are exceeded. No engine call is made in that case.
pub fn build_user_pod(config: &SandboxConfig) -> Result<UserPod> {
    let name = name::encode(&config.metadata)?;

    if config.labels.len() > MAX_LABELS_PER_SANDBOX {
        return Err(Error::SpecBuild {
            sandbox: config.metadata.to_string(),
            reason: format!("too many labels (max {MAX_LABELS_PER_SANDBOX})"),
        });
    }
    if config.annotations.len() > MAX_ANNOTATIONS_PER_SANDBOX {
        return Err(Error::SpecBuild {
            sandbox: config.metadata.to_string(),
            reason: format!("too many annotations (max {MAX_ANNOTATIONS_PER_SANDBOX})"),
        });
    }

    Ok(UserPod {
        name,
        hostname: config.hostname.clone(),
        labels: labels::merge(&config.labels, &config.annotations),
    })
}
