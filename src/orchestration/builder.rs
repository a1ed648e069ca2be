//! Image builder abstraction
//!
//! The prebuild engine never spawns processes itself. It is handed an
//! `ImageBuilder`, so tests can substitute a fake and the CLI can supply
//! the real devcontainer/docker implementation.

use crate::error::PrebakeResult;
use async_trait::async_trait;
use std::path::Path;

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The builder's diagnostic text: stderr, or stdout when stderr is empty
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// External image build capability
#[async_trait]
pub trait ImageBuilder: Send + Sync {
    /// Build the devcontainer rooted at `context_dir` as image `tag`.
    ///
    /// A non-zero exit is reported through `CommandOutput`, not as an error;
    /// `Err` means the command could not be run at all.
    async fn build_image(
        &self,
        context_dir: &Path,
        tag: &str,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> PrebakeResult<CommandOutput>;

    /// Probe whether `tag` exists locally (exit code 0 means present)
    async fn image_exists(&self, tag: &str) -> PrebakeResult<CommandOutput>;

    /// Human-readable builder name for display
    fn builder_name(&self) -> &str;
}
