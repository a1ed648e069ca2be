//! Per-project prebuild cache
//!
//! Each project gets a directory under `<state_dir>/prebuilds/<key>/`, where
//! `<key>` is derived from the SHA256 of the project's config path.
//!
//! # Layout
//!
//! | File                | Contents                                   |
//! |---------------------|--------------------------------------------|
//! | `metadata.json`     | original FROM reference, cache tag, time   |
//! | `Dockerfile`        | reduced Dockerfile from the last build     |
//! | `devcontainer.json` | reduced config from the last build         |
//!
//! Files are replaced whole via write-then-rename, so readers never see
//! partial contents. A missing or corrupt file reads as absent.

pub mod lockfile;
pub mod metadata;
pub mod snapshot;

pub use lockfile::{extract_namespace, reconcile, LOCKFILE_NAME};
pub use metadata::PrebuildMetadata;
pub use snapshot::{save_snapshot, snapshot_changed, BuildContext};

use crate::error::{PrebakeError, PrebakeResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Cache directory for a single project
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Cache directory for the project whose config lives at `config_path`
    pub fn for_project(state_dir: &Path, config_path: &Path) -> Self {
        let canonical = config_path
            .canonicalize()
            .unwrap_or_else(|_| config_path.to_path_buf());

        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string_lossy().as_bytes());
        let result = hasher.finalize();

        // First 12 hex characters (6 bytes)
        let key = hex::encode(&result[..6]);
        debug!("Cache key for {}: {}", canonical.display(), key);

        Self {
            root: state_dir.join("prebuilds").join(key),
        }
    }

    /// Use an explicit directory
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root of the cache directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    pub fn build_file_path(&self) -> PathBuf {
        self.root.join("Dockerfile")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("devcontainer.json")
    }

    /// Advisory lock file, a sibling of the cache directory so that
    /// purging the cache never removes a held lock
    pub fn lock_path(&self) -> PathBuf {
        self.root.with_extension("lock")
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Delete the cache directory and everything in it
    pub async fn remove(&self) -> PrebakeResult<()> {
        if !self.exists() {
            return Ok(());
        }
        tokio::fs::remove_dir_all(&self.root).await.map_err(|e| {
            PrebakeError::io(format!("removing cache directory {}", self.root.display()), e)
        })?;
        info!("Removed prebuild cache {}", self.root.display());
        Ok(())
    }
}

/// Write a file by writing a temporary sibling and renaming it into place
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> PrebakeResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PrebakeError::io(format!("creating directory {}", parent.display()), e))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| PrebakeError::io(format!("writing {}", tmp.display()), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| PrebakeError::io(format!("renaming into {}", path.display()), e))?;

    Ok(())
}
