//! Orchestration of external build tooling
//!
//! - `builder`: the `ImageBuilder` capability handed to the prebuild engine
//! - `devcontainer_cli`: default implementation over the devcontainer and
//!   docker CLIs

mod builder;
mod devcontainer_cli;

pub use builder::{CommandOutput, ImageBuilder};
pub use devcontainer_cli::DevcontainerCli;

use crate::error::{PrebakeError, PrebakeResult};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns the collected `(stdout, stderr)` text. Lines are decoded lossily
/// so that invalid UTF-8 never stops a pipe from being drained. This is a
/// standalone async function (not behind `async_trait`) to avoid lifetime
/// issues with the `dyn Fn` callback.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> PrebakeResult<(String, String)> {
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| PrebakeError::Internal("child stderr not piped".to_string()))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| PrebakeError::Internal("child stdout not piped".to_string()))?;

    let mut stderr_reader = BufReader::new(stderr).split(b'\n');
    let mut stdout_reader = BufReader::new(stdout).split(b'\n');

    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            segment = stderr_reader.next_segment(), if !stderr_done => {
                match segment {
                    Ok(Some(bytes)) => {
                        let line = decode_line(&bytes);
                        on_output(line.clone());
                        stderr_lines.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            segment = stdout_reader.next_segment(), if !stdout_done => {
                match segment {
                    Ok(Some(bytes)) => {
                        let line = decode_line(&bytes);
                        on_output(line.clone());
                        stdout_lines.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    Ok((stdout_lines.join("\n"), stderr_lines.join("\n")))
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
