//! Tests for constants module.
//!
//! Validates the naming layout constants and that limits and timeouts are in
//! sane ranges.

use podbridge::*;
use std::time::Duration;

// =============================================================================
// Naming Tests
// =============================================================================

#[test]
fn test_name_layout() {
    assert_eq!(SANDBOX_NAME_PREFIX, "k8s");
    assert_eq!(SANDBOX_NAME_SEPARATOR, '_');
    assert_eq!(SANDBOX_NAME_FIELDS, 5);
    assert!(
        !SANDBOX_NAME_PREFIX.contains(SANDBOX_NAME_SEPARATOR),
        "prefix must not contain the separator"
    );
}

#[test]
fn test_label_prefixes_distinct() {
    assert_ne!(ANNOTATION_PREFIX, LABEL_ESCAPE_PREFIX);
    assert!(!ANNOTATION_PREFIX.starts_with(LABEL_ESCAPE_PREFIX));
    assert!(!LABEL_ESCAPE_PREFIX.starts_with(ANNOTATION_PREFIX));
}

// =============================================================================
// Limit Tests
// =============================================================================

#[test]
fn test_label_limits_reasonable() {
    assert!(MAX_LABELS_PER_SANDBOX >= 16, "label limit too restrictive");
    assert!(MAX_ANNOTATIONS_PER_SANDBOX >= 16, "annotation limit too restrictive");
}

#[test]
fn test_response_line_holds_large_listing() {
    assert!(MAX_RESPONSE_LINE >= MAX_MANIFEST_SIZE);
}

// =============================================================================
// Timeout Tests
// =============================================================================

#[test]
fn test_engine_timeout_reasonable() {
    assert!(ENGINE_CONNECTION_TIMEOUT >= Duration::from_secs(30));
    assert!(ENGINE_CONNECTION_TIMEOUT <= Duration::from_secs(600));
}

#[test]
fn test_nanos_per_second() {
    assert_eq!(NANOS_PER_SECOND, Duration::from_secs(1).as_nanos() as i64);
}

#[test]
fn test_minimum_engine_version_parses() {
    assert!(semver::Version::parse(MINIMUM_ENGINE_VERSION).is_ok());
}
