//! Prebuild state and operation outcomes

use crate::cache::PrebuildMetadata;
use std::fmt;

/// Where a project stands, derived once per invocation from the stored
/// metadata and the build file's current declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrebuildState {
    /// No metadata: the project was never prebuilt (or was purged)
    None,
    /// Metadata present and the declaration names the cache tag
    Active(PrebuildMetadata),
    /// Metadata present, declaration restored to the original reference
    Cached(PrebuildMetadata),
}

impl PrebuildState {
    pub fn resolve(metadata: Option<PrebuildMetadata>, declaration_is_cache_tag: bool) -> Self {
        match (metadata, declaration_is_cache_tag) {
            (None, _) => Self::None,
            (Some(metadata), true) => Self::Active(metadata),
            (Some(metadata), false) => Self::Cached(metadata),
        }
    }

    pub fn metadata(&self) -> Option<&PrebuildMetadata> {
        match self {
            Self::None => None,
            Self::Active(metadata) | Self::Cached(metadata) => Some(metadata),
        }
    }
}

impl fmt::Display for PrebuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Active(_) => write!(f, "active"),
            Self::Cached(_) => write!(f, "cached"),
        }
    }
}

/// Result of a prebuild, restore or status call. Failures are returned as
/// errors and mapped to a failing exit code by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: Option<String>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    /// Success with nothing to report
    pub fn silent() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Message text, empty when silent
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}
