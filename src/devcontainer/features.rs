//! Feature identifiers and overlap detection

use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Strip the version from a feature reference.
///
/// `ghcr.io/acme/features/node:1` and `ghcr.io/acme/features/node@sha256:..`
/// both identify `ghcr.io/acme/features/node`. A colon before the last `/`
/// is a registry port and is kept.
pub fn feature_id(reference: &str) -> &str {
    let without_digest = reference.split('@').next().unwrap_or(reference);
    let last_segment = without_digest.rfind('/').map(|i| i + 1).unwrap_or(0);

    match without_digest[last_segment..].rfind(':') {
        Some(i) => &without_digest[..last_segment + i],
        None => without_digest,
    }
}

/// Identifiers declared both as prebuild features and as project features,
/// sorted and deduplicated.
pub fn find_overlap(prebuild: &Map<String, Value>, project: &Map<String, Value>) -> Vec<String> {
    let project_ids: BTreeSet<&str> = project.keys().map(|k| feature_id(k)).collect();

    prebuild
        .keys()
        .map(|k| feature_id(k))
        .filter(|id| project_ids.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
