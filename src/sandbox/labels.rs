//! Label / annotation partitioning.
//!
//! The engine stores a single label map per pod. Agent annotations are kept
//! in it under [`ANNOTATION_PREFIX`]. Agent labels are stored verbatim unless
//! their key already starts with a reserved prefix, in which case they are
//! stored under [`LABEL_ESCAPE_PREFIX`]. `split` strips that escape only when
//! what follows is itself reserved; any other `label.` key written by the
//! engine is kept verbatim. So `split(merge(l, a)) == (l, a)` for any maps.

use crate::constants::{ANNOTATION_PREFIX, LABEL_ESCAPE_PREFIX};
use std::collections::HashMap;

fn is_reserved(key: &str) -> bool {
    key.starts_with(ANNOTATION_PREFIX) || key.starts_with(LABEL_ESCAPE_PREFIX)
}

/// Merges agent labels and annotations into an engine label map.
#[must_use]
pub fn merge(
    labels: &HashMap<String, String>,
    annotations: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = HashMap::with_capacity(labels.len() + annotations.len());

    for (key, value) in labels {
        let stored = if is_reserved(key) {
            format!("{LABEL_ESCAPE_PREFIX}{key}")
        } else {
            key.clone()
        };
        merged.insert(stored, value.clone());
    }

    for (key, value) in annotations {
        merged.insert(format!("{ANNOTATION_PREFIX}{key}"), value.clone());
    }

    merged
}

/// Splits an engine label map into `(labels, annotations)`.
///
/// Every input key lands in exactly one of the two maps.
#[must_use]
pub fn split(
    stored: &HashMap<String, String>,
) -> (HashMap<String, String>, HashMap<String, String>) {
    let mut labels = HashMap::new();
    let mut annotations = HashMap::new();

    for (key, value) in stored {
        if let Some(annotation) = key.strip_prefix(ANNOTATION_PREFIX) {
            annotations.insert(annotation.to_string(), value.clone());
        } else if let Some(label) = key.strip_prefix(LABEL_ESCAPE_PREFIX)
            && is_reserved(label)
        {
            labels.insert(label.to_string(), value.clone());
        } else {
            labels.insert(key.clone(), value.clone());
        }
    }

    (labels, annotations)
}
