//! Sandbox name codec.
//!
//! The engine has no separate identity store: the pod name is the only place
//! sandbox identity survives. Names have the form
//!
//! ```text
//! k8s_<name>_<namespace>_<uid>_<attempt>
//! ```
//!
//! Each field is percent-escaped for `%`, `_`, control characters and all
//! non-ASCII bytes, so any field value round-trips. Decoding is strict: a
//! field must re-encode to exactly the text it was parsed from, which rejects
//! hand-written or truncated names instead of guessing.

use crate::constants::{SANDBOX_NAME_FIELDS, SANDBOX_NAME_PREFIX, SANDBOX_NAME_SEPARATOR};
use crate::error::{Error, Result};
use crate::sandbox::SandboxMetadata;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Bytes escaped inside a name field.
const FIELD_ESCAPE: &AsciiSet = &CONTROLS.add(b'%').add(b'_');

fn escape(field: &str) -> String {
    utf8_percent_encode(field, FIELD_ESCAPE).to_string()
}

/// Encodes sandbox metadata into an engine pod name.
///
/// # Errors
///
/// `SpecBuild` if name, namespace or uid is empty.
pub fn encode(metadata: &SandboxMetadata) -> Result<String> {
    for (field, value) in [
        ("name", &metadata.name),
        ("namespace", &metadata.namespace),
        ("uid", &metadata.uid),
    ] {
        if value.is_empty() {
            return Err(Error::SpecBuild {
                sandbox: metadata.to_string(),
                reason: format!("metadata.{field} is required"),
            });
        }
    }

    let sep = SANDBOX_NAME_SEPARATOR.to_string();
    Ok([
        SANDBOX_NAME_PREFIX.to_string(),
        escape(&metadata.name),
        escape(&metadata.namespace),
        escape(&metadata.uid),
        metadata.attempt.to_string(),
    ]
    .join(&sep))
}

/// Decodes an engine pod name back into sandbox metadata.
///
/// # Errors
///
/// `InvalidNameFormat` when the name has the wrong number of fields, the
/// wrong prefix, an empty or non-canonically escaped field, or an attempt
/// that is not a canonical non-negative decimal.
pub fn decode(token: &str) -> Result<SandboxMetadata> {
    let invalid = |reason: String| Error::InvalidNameFormat {
        name: token.to_string(),
        reason,
    };

    let parts: Vec<&str> = token.split(SANDBOX_NAME_SEPARATOR).collect();
    if parts.len() != SANDBOX_NAME_FIELDS {
        return Err(invalid(format!(
            "expected {SANDBOX_NAME_FIELDS} fields, found {}",
            parts.len()
        )));
    }
    if parts[0] != SANDBOX_NAME_PREFIX {
        return Err(invalid(format!("missing '{SANDBOX_NAME_PREFIX}' prefix")));
    }

    let name = unescape(parts[1], "name").map_err(&invalid)?;
    let namespace = unescape(parts[2], "namespace").map_err(&invalid)?;
    let uid = unescape(parts[3], "uid").map_err(&invalid)?;
    let attempt = parse_attempt(parts[4]).map_err(&invalid)?;

    Ok(SandboxMetadata {
        name,
        namespace,
        uid,
        attempt,
    })
}

fn unescape(field: &str, what: &str) -> std::result::Result<String, String> {
    if field.is_empty() {
        return Err(format!("{what} is empty"));
    }
    let decoded = percent_decode_str(field)
        .decode_utf8()
        .map_err(|e| format!("{what} is not valid UTF-8: {e}"))?
        .into_owned();
    if escape(&decoded) != field {
        return Err(format!("{what} '{field}' is not canonically escaped"));
    }
    Ok(decoded)
}

fn parse_attempt(field: &str) -> std::result::Result<u32, String> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("attempt '{field}' is not a non-negative integer"));
    }
    let attempt = field
        .parse::<u32>()
        .map_err(|e| format!("attempt '{field}': {e}"))?;
    if attempt.to_string() != field {
        return Err(format!("attempt '{field}' has leading zeros"));
    }
    Ok(attempt)
}
