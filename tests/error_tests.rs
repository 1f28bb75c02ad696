//! Tests for error types.
//!
//! Validates display formatting, source chaining and error category helpers.

use podbridge::{EngineError, Error};
use std::error::Error as _;
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Translation Error Tests
// =============================================================================

#[test]
fn test_spec_build_display() {
    let err = Error::SpecBuild {
        sandbox: "default/web".to_string(),
        reason: "metadata.uid is required".to_string(),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("default/web"), "should include sandbox");
    assert!(msg.contains("metadata.uid"), "should include reason");
}

#[test]
fn test_invalid_name_format_display() {
    let err = Error::InvalidNameFormat {
        name: "k8s_broken".to_string(),
        reason: "expected 5 fields, found 2".to_string(),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("k8s_broken"), "should include the name");
    assert!(msg.contains("5 fields"), "should include reason");
}

// =============================================================================
// Engine Error Tests
// =============================================================================

#[test]
fn test_engine_error_attribution() {
    let err = Error::Engine {
        operation: "stop_pod",
        id: "pod-1".to_string(),
        source: EngineError::Remote {
            code: 17,
            cause: "vm not responding".to_string(),
        },
    };
    let msg = format!("{}", err);

    assert!(msg.contains("stop_pod"), "should include operation");
    assert!(msg.contains("pod-1"), "should include pod ID");
    assert!(msg.contains("17"), "should include engine code");
    assert!(msg.contains("vm not responding"), "should include engine cause");
    assert!(err.source().is_some(), "should chain the engine error");
}

#[test]
fn test_engine_timeout_display() {
    let err = EngineError::Timeout(Duration::from_secs(300));
    let msg = format!("{}", err);

    assert!(msg.contains("timed out"), "should indicate timeout");
    assert!(msg.contains("300"), "should include duration");
    assert!(err.code_and_cause().is_none());
}

#[test]
fn test_connection_failed_display() {
    let err = EngineError::ConnectionFailed {
        endpoint: "unix:///var/run/hyper.sock".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("/var/run/hyper.sock"), "should include endpoint");
    assert!(msg.contains("no such file"), "should include cause");
}

#[test]
fn test_unsupported_engine_version_display() {
    let err = Error::UnsupportedEngineVersion {
        found: "0.5.1".to_string(),
        required: "0.6.0".to_string(),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("0.5.1"), "should include found version");
    assert!(msg.contains("0.6.0"), "should include required version");
}

// =============================================================================
// Capability and Configuration Error Tests
// =============================================================================

#[test]
fn test_not_supported_helper() {
    assert!(Error::NotSupported("attach".to_string()).is_not_supported());
    assert!(!Error::InvalidInput("x".to_string()).is_not_supported());
}

#[test]
fn test_read_failed_display() {
    let err = Error::ReadFailed {
        path: PathBuf::from("/etc/podbridge.yaml"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("/etc/podbridge.yaml"), "should include path");
    assert!(msg.contains("denied"), "should include cause");
}

// =============================================================================
// Error Trait Tests
// =============================================================================

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
    assert_send_sync::<EngineError>();
}
