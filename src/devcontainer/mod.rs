//! Project devcontainer configuration
//!
//! Everything prebake needs to know about `devcontainer.json`: which
//! features to prebuild, which Dockerfile to rewrite, and the reduced
//! configuration that keys the cache.

pub mod config;
pub mod features;
pub mod jsonc;

pub use config::{reduced_config, FeatureDeclaration, ProjectConfig};
pub use features::{feature_id, find_overlap};
