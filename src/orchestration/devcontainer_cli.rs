//! Image builder backed by the devcontainer and docker CLIs
//!
//! Builds run `devcontainer build` against the temporary context with the
//! experimental lock file enabled, so resolved feature versions land in
//! `<context>/.devcontainer/devcontainer-lock.json`. Image probes run
//! `docker image inspect`.

use crate::config::PrebuildConfig;
use crate::error::{PrebakeError, PrebakeResult};
use crate::orchestration::builder::{CommandOutput, ImageBuilder};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Default `ImageBuilder` using external CLIs
pub struct DevcontainerCli {
    builder: String,
    docker: String,
}

impl DevcontainerCli {
    /// Create a builder using the executables named in the settings
    pub fn new(config: &PrebuildConfig) -> Self {
        Self {
            builder: config.builder.clone(),
            docker: config.docker.clone(),
        }
    }

    /// Arguments for `devcontainer build`
    fn build_args(context_dir: &Path, tag: &str) -> Vec<String> {
        vec![
            "build".to_string(),
            "--workspace-folder".to_string(),
            context_dir.display().to_string(),
            "--image-name".to_string(),
            tag.to_string(),
            "--experimental-lockfile".to_string(),
        ]
    }
}

#[async_trait]
impl ImageBuilder for DevcontainerCli {
    async fn build_image(
        &self,
        context_dir: &Path,
        tag: &str,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> PrebakeResult<CommandOutput> {
        let args = Self::build_args(context_dir, tag);
        debug!("Executing: {} {:?}", self.builder, args);

        let mut child = Command::new(&self.builder)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PrebakeError::command_failed(format!("{} build", self.builder), e))?;

        let (stdout, stderr) = super::stream_child_output(&mut child, on_output).await?;

        let status = child
            .wait()
            .await
            .map_err(|e| PrebakeError::command_failed(format!("{} build", self.builder), e))?;

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }

    async fn image_exists(&self, tag: &str) -> PrebakeResult<CommandOutput> {
        debug!("Executing: {} image inspect {}", self.docker, tag);

        let output = Command::new(&self.docker)
            .args(["image", "inspect", tag])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| PrebakeError::command_failed(format!("{} image inspect", self.docker), e))?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn builder_name(&self) -> &str {
        &self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_name_context_and_tag() {
        let args = DevcontainerCli::build_args(Path::new("/tmp/ctx"), "prebake/base:1.0");
        assert_eq!(
            args,
            vec![
                "build",
                "--workspace-folder",
                "/tmp/ctx",
                "--image-name",
                "prebake/base:1.0",
                "--experimental-lockfile",
            ]
        );
    }

    #[test]
    fn uses_configured_executables() {
        let config = PrebuildConfig {
            builder: "/opt/bin/devcontainer".to_string(),
            ..Default::default()
        };
        let cli = DevcontainerCli::new(&config);
        assert_eq!(cli.builder_name(), "/opt/bin/devcontainer");
    }

    #[tokio::test]
    async fn missing_executable_is_command_failed() {
        let config = PrebuildConfig {
            docker: "prebake-test-no-such-docker".to_string(),
            ..Default::default()
        };
        let cli = DevcontainerCli::new(&config);
        let err = cli.image_exists("x:1").await.unwrap_err();
        assert!(matches!(err, PrebakeError::CommandFailed { .. }));
    }
}
