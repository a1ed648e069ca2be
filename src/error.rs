//! Error types for prebake
//!
//! All modules use `PrebakeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for prebake operations
pub type PrebakeResult<T> = Result<T, PrebakeError>;

/// All errors that can occur in prebake
#[derive(Error, Debug)]
pub enum PrebakeError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No build file to rewrite in {path}: {reason}")]
    BuildFileMissing { path: PathBuf, reason: String },

    // Build file errors
    #[error("Dockerfile line {line}: {message}")]
    Parse { line: usize, message: String },

    // Feature errors
    #[error("Prebuild features overlap with project features: {}", ids.join(", "))]
    FeatureOverlap { ids: Vec<String> },

    // Build errors
    #[error("Prebuild of {tag} failed:\n{output}")]
    Build { tag: String, output: String },

    #[error("Build file references cache image {tag} but no prebuild metadata exists")]
    MetadataMissing { tag: String },

    // Port errors
    #[error("No free port in range {start}-{end}")]
    PortsExhausted { start: u16, end: u16 },

    // Locking errors
    #[error("Another prebake process holds the project lock: {0}")]
    LockHeld(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrebakeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a parse error for a zero-based line index
    pub fn parse_at(index: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line: index + 1,
            message: message.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::BuildFileMissing { .. } => {
                Some("Prebuilds need a Dockerfile: set build.dockerfile in devcontainer.json")
            }
            Self::FeatureOverlap { .. } => {
                Some("Remove the listed features from either prebuildFeatures or features")
            }
            Self::MetadataMissing { .. } => {
                Some("Restore the FROM line by hand, then run: prebake prebuild")
            }
            Self::PortsExhausted { .. } => {
                Some("Free a port in the range or widen [ports] in config.toml")
            }
            Self::LockHeld(_) => Some("Wait for the other prebake invocation to finish"),
            Self::CommandFailed { .. } => {
                Some("Install the devcontainer CLI: npm install -g @devcontainers/cli")
            }
            _ => None,
        }
    }
}
