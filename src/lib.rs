//! Prebake - devcontainer feature prebuilds
//!
//! Bakes a project's slow-to-install devcontainer features into a cached
//! base image, rewrites the Dockerfile's first `FROM` to point at it, and
//! restores the original reference on request. Also hands out stable
//! ports to forwarded services.

pub mod cache;
pub mod cli;
pub mod config;
pub mod devcontainer;
pub mod dockerfile;
pub mod error;
pub mod orchestration;
pub mod ports;
pub mod prebuild;
pub mod ui;

pub use error::{PrebakeError, PrebakeResult};
