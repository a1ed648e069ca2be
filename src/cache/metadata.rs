//! Prebuild metadata persistence
//!
//! The metadata file is the only record that a prebuild ever completed for
//! a project. Its absence means no prebuild state exists.

use crate::cache::{write_atomic, CacheDir};
use crate::error::PrebakeResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Record written after every successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuildMetadata {
    /// The FROM reference as the user wrote it
    pub original_from: String,

    /// The cache tag the FROM line is rewritten to
    pub cache_tag: String,

    /// When the cache image was last built
    pub timestamp: DateTime<Utc>,
}

impl PrebuildMetadata {
    /// Create a record stamped with the current time
    pub fn new(original_from: impl Into<String>, cache_tag: impl Into<String>) -> Self {
        Self {
            original_from: original_from.into(),
            cache_tag: cache_tag.into(),
            timestamp: Utc::now(),
        }
    }

    /// Load metadata from the cache directory.
    ///
    /// A missing, unreadable or corrupt file is reported as `None`.
    pub async fn load(cache: &CacheDir) -> Option<Self> {
        let path = cache.metadata_path();
        let content = tokio::fs::read_to_string(&path).await.ok()?;

        match serde_json::from_str(&content) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(
                    "Ignoring corrupt prebuild metadata {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Write the whole record atomically
    pub async fn save(&self, cache: &CacheDir) -> PrebakeResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(&cache.metadata_path(), content.as_bytes()).await
    }
}
