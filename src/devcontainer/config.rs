//! Project devcontainer configuration
//!
//! Reads `devcontainer.json`, classifies the declared prebuild features,
//! resolves the Dockerfile it builds from, and produces the reduced
//! configuration used as the prebuild context.

use crate::devcontainer::jsonc;
use crate::error::{PrebakeError, PrebakeResult};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Customization key owned by prebake (`customizations.prebake`)
pub const CUSTOMIZATION_KEY: &str = "prebake";

/// Feature map key inside the prebake customization
pub const PREBUILD_FEATURES_KEY: &str = "prebuildFeatures";

/// Conventional config locations, in lookup order, relative to the workspace
const CONFIG_CANDIDATES: &[&str] = &[".devcontainer/devcontainer.json", ".devcontainer.json"];

/// How the project declares its prebuild features
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureDeclaration {
    /// The key path is missing entirely
    Absent,
    /// Explicit `null`: the project opted out
    Null,
    /// Present with zero entries
    Empty,
    /// Non-empty feature map to bake into the cache image
    Features(Map<String, Value>),
}

/// Parsed `devcontainer.json`
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    path: PathBuf,
    root: Map<String, Value>,
}

impl ProjectConfig {
    /// Load and parse a comment-tolerant config file
    pub async fn load(path: &Path) -> PrebakeResult<Self> {
        if !path.exists() {
            return Err(PrebakeError::ConfigNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PrebakeError::io(format!("reading {}", path.display()), e))?;

        Self::parse(path, &content)
    }

    /// Parse config text; `path` is used for error messages and path resolution
    pub fn parse(path: &Path, content: &str) -> PrebakeResult<Self> {
        let invalid = |reason: String| PrebakeError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value =
            serde_json::from_str(&jsonc::strip(content)).map_err(|e| invalid(e.to_string()))?;

        match value {
            Value::Object(root) => Ok(Self {
                path: path.to_path_buf(),
                root,
            }),
            _ => Err(invalid("top level must be an object".to_string())),
        }
    }

    /// Locate the project config under a workspace directory
    pub fn find(workspace: &Path) -> Option<PathBuf> {
        CONFIG_CANDIDATES
            .iter()
            .map(|candidate| workspace.join(candidate))
            .find(|path| path.is_file())
    }

    /// Path of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the config file
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Classify `customizations.prebake.prebuildFeatures`
    pub fn prebuild_features(&self) -> PrebakeResult<FeatureDeclaration> {
        let declared = self
            .root
            .get("customizations")
            .and_then(|c| c.get(CUSTOMIZATION_KEY))
            .and_then(|p| p.get(PREBUILD_FEATURES_KEY));

        match declared {
            None => Ok(FeatureDeclaration::Absent),
            Some(Value::Null) => Ok(FeatureDeclaration::Null),
            Some(Value::Object(map)) if map.is_empty() => Ok(FeatureDeclaration::Empty),
            Some(Value::Object(map)) => Ok(FeatureDeclaration::Features(map.clone())),
            Some(other) => Err(PrebakeError::ConfigInvalid {
                path: self.path.clone(),
                reason: format!(
                    "customizations.{}.{} must be an object, found {}",
                    CUSTOMIZATION_KEY,
                    PREBUILD_FEATURES_KEY,
                    json_type(other)
                ),
            }),
        }
    }

    /// Top-level `features` map (empty when absent or not an object)
    pub fn features(&self) -> Map<String, Value> {
        self.root
            .get("features")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve the Dockerfile path.
    ///
    /// `build.dockerfile` is preferred, then the legacy top-level
    /// `dockerFile`; both are relative to the config directory.
    pub fn resolve_build_file(&self) -> PrebakeResult<PathBuf> {
        let structured = self
            .root
            .get("build")
            .and_then(|b| b.get("dockerfile"))
            .and_then(Value::as_str);
        let legacy = self.root.get("dockerFile").and_then(Value::as_str);

        if let Some(relative) = structured.or(legacy) {
            let path = self.dir().join(relative);
            debug!("Resolved build file: {}", path.display());
            return Ok(path);
        }

        let reason = if self.root.contains_key("dockerComposeFile") {
            "Docker Compose configurations are not supported"
        } else if self.root.contains_key("image") {
            "the configuration uses a prebuilt image"
        } else {
            "neither build.dockerfile nor dockerFile is set"
        };

        Err(PrebakeError::BuildFileMissing {
            path: self.path.clone(),
            reason: reason.to_string(),
        })
    }
}

/// Minimal devcontainer.json for the prebuild context.
///
/// Only the Dockerfile reference and the prebuild features are carried, so
/// edits elsewhere in the project config never invalidate the cache.
pub fn reduced_config(features: &Map<String, Value>, build_file: &str) -> String {
    let reduced = json!({
        "build": { "dockerfile": build_file },
        "features": features,
    });
    let mut out = serde_json::to_string_pretty(&reduced).unwrap_or_default();
    out.push('\n');
    out
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
