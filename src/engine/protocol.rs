//! Engine wire protocol.
//!
//! # Protocol Format
//!
//! - **Transport**: Unix domain socket or TCP
//! - **Encoding**: JSON
//! - **Framing**: Newline-delimited (each message ends with `\n`)
//!
//! # Request/Response Flow
//!
//! ```text
//! podbridge                        hyperd
//!   |                                 |
//!   |  {"action":"start_pod",...}\n   |
//!   |-------------------------------->|
//!   |                                 |
//!   |  {"status":"ok"}\n              |
//!   |<--------------------------------|
//! ```
//!
//! | Action | Response data |
//! |--------|---------------|
//! | `version` | `version` |
//! | `create_pod` | `pod_created` |
//! | `start_pod` | none |
//! | `stop_pod` | `pod_stopped` |
//! | `remove_pod` | none |
//! | `pod_info` | `pod_info` |
//! | `pod_list` | `pod_list` |

use super::{EngineRecord, UserPod};
use serde::{Deserialize, Serialize};

// =============================================================================
// Request Types
// =============================================================================

/// Request from the adapter to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Query daemon version.
    Version,
    /// Create a pod.
    CreatePod {
        /// Pod spec.
        spec: UserPod,
    },
    /// Start a pod.
    StartPod {
        /// Engine pod ID.
        pod_id: String,
    },
    /// Stop a pod.
    StopPod {
        /// Engine pod ID.
        pod_id: String,
    },
    /// Remove a pod.
    RemovePod {
        /// Engine pod ID.
        pod_id: String,
    },
    /// Fetch one pod record.
    PodInfo {
        /// Engine pod ID.
        pod_id: String,
    },
    /// Fetch all pod records.
    PodList,
}

impl Request {
    /// Short name used in diagnostics.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::CreatePod { .. } => "create_pod",
            Self::StartPod { .. } => "start_pod",
            Self::StopPod { .. } => "stop_pod",
            Self::RemovePod { .. } => "remove_pod",
            Self::PodInfo { .. } => "pod_info",
            Self::PodList => "pod_list",
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Response from the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// Success response.
    Ok(OkPayload),
    /// Error response.
    Error(ErrorPayload),
}

impl Response {
    /// Creates a success response with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self::Ok(OkPayload { data: None })
    }

    /// Creates a success response with data.
    #[must_use]
    pub fn ok_with_data(data: ResponseData) -> Self {
        Self::Ok(OkPayload { data: Some(data) })
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(code: i32, cause: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            code,
            cause: cause.into(),
        })
    }
}

/// Success payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkPayload {
    /// Optional response data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

/// Response data variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseData {
    /// Daemon version.
    Version {
        /// Daemon version.
        version: String,
        /// API version.
        api_version: String,
    },
    /// Pod created.
    PodCreated {
        /// Engine pod ID.
        pod_id: String,
    },
    /// Pod stopped.
    PodStopped {
        /// Engine result code.
        code: i32,
        /// Engine cause text.
        cause: String,
    },
    /// One pod record.
    PodInfo {
        /// The record.
        pod: EngineRecord,
    },
    /// All pod records.
    PodList {
        /// The records.
        pods: Vec<EngineRecord>,
    },
}

/// Error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Engine result code.
    pub code: i32,
    /// Human-readable cause.
    pub cause: String,
}

// =============================================================================
// Wire Format Helpers
// =============================================================================

impl Request {
    /// Serializes request to JSON line (with newline).
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Deserializes request from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if JSON deserialization fails.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s.trim())
    }
}

impl Response {
    /// Serializes response to JSON line (with newline).
    ///
    /// # Errors
    ///
    /// Returns error if JSON serialization fails.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Deserializes response from JSON.
    ///
    /// # Errors
    ///
    /// Returns error if JSON deserialization fails.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_error_response() {
        let resp = Response::error(404, "pod not found");
        let json = resp.to_json_line().unwrap();
        assert!(json.ends_with('\n'));
        assert!(json.contains("\"status\":\"error\""));
        assert!(json.contains("\"code\":404"));
        assert!(json.contains("\"cause\":\"pod not found\""));
    }

    #[test]
    fn test_unit_requests() {
        let json = Request::PodList.to_json_line().unwrap();
        assert_eq!(json, "{\"action\":\"pod_list\"}\n");
        assert_eq!(Request::from_json(&json).unwrap(), Request::PodList);
    }

    #[test]
    fn test_create_pod_request() {
        let req = Request::CreatePod {
            spec: UserPod {
                name: "k8s_web_default_u1_0".to_string(),
                hostname: None,
                labels: HashMap::from([("app".to_string(), "web".to_string())]),
            },
        };
        let json = req.to_json_line().unwrap();
        assert!(json.contains("\"action\":\"create_pod\""));
        assert!(json.contains("\"name\":\"k8s_web_default_u1_0\""));
        assert!(!json.contains("hostname"));
    }

    #[test]
    fn test_pod_info_response() {
        let line = r#"{"status":"ok","data":{"type":"pod_info","pod":{"pod_id":"pod-1","pod_name":"k8s_a_b_c_0","phase":"running","created_at":1000,"pod_ip":["10.0.0.5"]}}}"#;
        let resp = Response::from_json(line).unwrap();
        let Response::Ok(OkPayload {
            data: Some(ResponseData::PodInfo { pod }),
        }) = &resp
        else {
            panic!("unexpected response: {resp:?}");
        };
        assert_eq!(pod.pod_id, "pod-1");
        assert!(pod.labels.is_empty());
        assert_eq!(pod.pod_ip, vec!["10.0.0.5".to_string()]);
    }
}
