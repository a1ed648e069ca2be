//! Build context snapshots
//!
//! The reduced Dockerfile and reduced config from the last successful build
//! are kept next to the metadata. A fresh context is compared against them
//! to decide whether the cache image is still valid.

use crate::cache::{write_atomic, CacheDir};
use crate::error::{PrebakeError, PrebakeResult};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the directory holding the config inside a build context
const CONTEXT_CONFIG_DIR: &str = ".devcontainer";

/// Dockerfile name inside the context, referenced by the reduced config
pub const CONTEXT_BUILD_FILE: &str = "Dockerfile";

/// The minimal build context: everything that determines the cache image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Reduced Dockerfile (ARG prelude + first FROM)
    pub build_file: String,
    /// Reduced devcontainer.json (build reference + prebuild features)
    pub config: String,
}

impl BuildContext {
    /// Materialize the context under `dir`, returning the directory the
    /// builder writes its outputs (such as the lock file) into.
    ///
    /// ```text
    /// <dir>/.devcontainer/Dockerfile
    /// <dir>/.devcontainer/devcontainer.json
    /// ```
    pub async fn write_to(&self, dir: &Path) -> PrebakeResult<PathBuf> {
        let config_dir = dir.join(CONTEXT_CONFIG_DIR);
        tokio::fs::create_dir_all(&config_dir).await.map_err(|e| {
            PrebakeError::io(format!("creating build context {}", config_dir.display()), e)
        })?;

        let build_file = config_dir.join(CONTEXT_BUILD_FILE);
        tokio::fs::write(&build_file, &self.build_file)
            .await
            .map_err(|e| PrebakeError::io(format!("writing {}", build_file.display()), e))?;

        let config = config_dir.join("devcontainer.json");
        tokio::fs::write(&config, &self.config)
            .await
            .map_err(|e| PrebakeError::io(format!("writing {}", config.display()), e))?;

        Ok(config_dir)
    }
}

/// Whether `context` differs from the stored snapshot.
///
/// An absent or unreadable snapshot counts as changed. The config is
/// compared structurally, so formatting-only differences are ignored; the
/// Dockerfile is machine-generated and compared after trimming.
pub async fn snapshot_changed(cache: &CacheDir, context: &BuildContext) -> bool {
    let Ok(stored_build_file) = tokio::fs::read_to_string(cache.build_file_path()).await else {
        debug!("No stored Dockerfile snapshot in {}", cache.path().display());
        return true;
    };
    let Ok(stored_config) = tokio::fs::read_to_string(cache.config_path()).await else {
        debug!("No stored config snapshot in {}", cache.path().display());
        return true;
    };

    if stored_build_file.trim() != context.build_file.trim() {
        debug!("Reduced Dockerfile changed");
        return true;
    }

    match (
        serde_json::from_str::<Value>(&stored_config),
        serde_json::from_str::<Value>(&context.config),
    ) {
        (Ok(stored), Ok(fresh)) => {
            let changed = stored != fresh;
            if changed {
                debug!("Reduced config changed");
            }
            changed
        }
        _ => true,
    }
}

/// Replace the stored snapshot with `context`
pub async fn save_snapshot(cache: &CacheDir, context: &BuildContext) -> PrebakeResult<()> {
    write_atomic(&cache.build_file_path(), context.build_file.as_bytes()).await?;
    write_atomic(&cache.config_path(), context.config.as_bytes()).await
}
