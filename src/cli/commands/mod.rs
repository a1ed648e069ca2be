//! CLI command implementations

pub mod config;
pub mod ports;
pub mod prebuild;
pub mod restore;
pub mod status;

pub use config::execute as config;
pub use ports::execute as ports;
pub use prebuild::execute as prebuild;
pub use restore::execute as restore;
pub use status::execute as status;

use crate::devcontainer::ProjectConfig;
use crate::error::{PrebakeError, PrebakeResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locate the project's devcontainer.json.
///
/// An explicit `--devcontainer` path wins; otherwise the conventional
/// locations under the workspace are searched.
pub fn resolve_config_path(workspace: &Path, explicit: Option<&Path>) -> PrebakeResult<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let found = ProjectConfig::find(workspace).ok_or_else(|| {
        PrebakeError::ConfigNotFound(workspace.join(".devcontainer").join("devcontainer.json"))
    })?;
    debug!("Using project config {}", found.display());
    Ok(found)
}
