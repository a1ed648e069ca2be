//! Project lock file reconciliation
//!
//! The devcontainer builder pins the features it resolved in a
//! `devcontainer-lock.json` inside the build context. Those pins are copied
//! into the project's own lock file under one reserved top-level key, which
//! prebake owns exclusively. Every other key belongs to other tools.

use super::write_atomic;
use crate::error::{PrebakeError, PrebakeResult};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// File name of both the builder's and the project's lock file
pub const LOCKFILE_NAME: &str = "devcontainer-lock.json";

/// Key holding feature pins inside the builder's lock file
const BUILDER_FEATURES_KEY: &str = "features";

/// Merge the builder's resolved features into the project lock file.
///
/// Returns `false` without touching anything when the builder produced no
/// lock file in `builder_output_dir`. Otherwise the `namespace` key is
/// replaced wholesale (never merged) and all other keys are written back
/// in their original order.
pub async fn reconcile(
    project_lock: &Path,
    builder_output_dir: &Path,
    namespace: &str,
) -> PrebakeResult<bool> {
    let builder_lock = builder_output_dir.join(LOCKFILE_NAME);
    let Some(builder) = read_object(&builder_lock).await? else {
        debug!(
            "Builder produced no lock file in {}, skipping reconciliation",
            builder_output_dir.display()
        );
        return Ok(false);
    };

    let resolved = match builder.get(BUILDER_FEATURES_KEY) {
        Some(Value::Object(features)) => features.clone(),
        _ => Map::new(),
    };

    let mut project = read_object(project_lock).await?.unwrap_or_default();
    let count = resolved.len();
    project.insert(namespace.to_string(), Value::Object(resolved));

    let mut content = serde_json::to_string_pretty(&Value::Object(project))?;
    content.push('\n');
    write_atomic(project_lock, content.as_bytes()).await?;

    info!(
        "Recorded {} prebuilt feature pin(s) in {}",
        count,
        project_lock.display()
    );
    Ok(true)
}

/// Contents of the reserved key, empty when the file or key is absent
pub async fn extract_namespace(
    project_lock: &Path,
    namespace: &str,
) -> PrebakeResult<Map<String, Value>> {
    let project = read_object(project_lock).await?.unwrap_or_default();

    Ok(match project.get(namespace) {
        Some(Value::Object(entries)) => entries.clone(),
        _ => Map::new(),
    })
}

/// Read a JSON object file; `None` when the file does not exist
async fn read_object(path: &Path) -> PrebakeResult<Option<Map<String, Value>>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PrebakeError::io(format!("reading {}", path.display()), e)),
    };

    if content.trim().is_empty() {
        return Ok(Some(Map::new()));
    }

    match serde_json::from_str(&content) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(PrebakeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: "lock file must contain a JSON object".to_string(),
        }),
        Err(e) => Err(PrebakeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
