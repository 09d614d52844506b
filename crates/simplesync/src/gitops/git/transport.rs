//! Repository transport capability and its git CLI implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::parse::parse_pull_output;
use super::types::PullOutcome;
use crate::gitops::command::{format_output, run_cancellable, CommandOutcome};
use crate::gitops::error::{classify_git_error, TransportError};

/// Fetches and refreshes a working copy of a remote repository.
///
/// Implementations must return promptly with [`TransportError::Cancelled`]
/// once `cancel` fires, terminating any underlying process.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Shallow-clones `remote` into the empty directory `dest`.
    async fn clone_repo(
        &self,
        remote: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError>;

    /// Updates the working copy at `workdir` to the latest remote state.
    async fn pull(
        &self,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PullOutcome, TransportError>;
}

/// Transport backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    /// Creates a transport that invokes the given git binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        // Never block on an interactive credential prompt.
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd
    }

    async fn run(
        &self,
        cmd: Command,
        cancel: &CancellationToken,
    ) -> Result<String, TransportError> {
        let outcome = run_cancellable(cmd, cancel)
            .await
            .map_err(|source| TransportError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        match outcome {
            CommandOutcome::Cancelled => Err(TransportError::Cancelled),
            CommandOutcome::Finished(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            CommandOutcome::Finished(output) => Err(classify_git_error(&format_output(&output))),
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl Transport for GitCli {
    async fn clone_repo(
        &self,
        remote: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        let mut cmd = self.command();
        cmd.args(["clone", "--depth", "1", "--", remote]).arg(dest);

        self.run(cmd, cancel).await?;
        log::debug!("Cloned {} into {}", remote, dest.display());
        Ok(())
    }

    async fn pull(
        &self,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PullOutcome, TransportError> {
        let mut cmd = self.command();
        cmd.current_dir(workdir).args(["pull", "--ff-only"]);

        let stdout = self.run(cmd, cancel).await?;
        Ok(parse_pull_output(&stdout))
    }
}
