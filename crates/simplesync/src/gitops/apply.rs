//! Cluster apply capability and its kubectl implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::command::{format_output, run_cancellable, CommandOutcome};
use super::error::ApplyError;

/// Pushes one manifest file's declared state to the target cluster.
#[async_trait]
pub trait Applier: Send + Sync {
    /// Applies the manifest at `manifest`, running inside `workdir`.
    ///
    /// Returns the tool's diagnostic output on success.
    async fn apply(
        &self,
        manifest: &Path,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, ApplyError>;
}

/// Applier backed by `kubectl apply -f`.
#[derive(Debug, Clone)]
pub struct KubectlApplier {
    program: PathBuf,
    context: Option<String>,
    dry_run: bool,
}

impl KubectlApplier {
    /// Creates an applier invoking the given kubectl binary.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            context: None,
            dry_run: false,
        }
    }

    /// Targets a specific kubeconfig context.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Validates manifests client-side without persisting them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Arguments passed to kubectl for `manifest`.
    pub fn args(&self, manifest: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        args.push("apply".to_string());
        if self.dry_run {
            args.push("--dry-run=client".to_string());
        }
        args.push("-f".to_string());
        args.push(manifest.display().to_string());
        args
    }
}

impl Default for KubectlApplier {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

#[async_trait]
impl Applier for KubectlApplier {
    async fn apply(
        &self,
        manifest: &Path,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, ApplyError> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(workdir).args(self.args(manifest));

        let outcome = run_cancellable(cmd, cancel)
            .await
            .map_err(|source| ApplyError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        match outcome {
            CommandOutcome::Cancelled => Err(ApplyError::Cancelled),
            CommandOutcome::Finished(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            CommandOutcome::Finished(output) => Err(ApplyError::Rejected {
                path: manifest.to_path_buf(),
                output: format_output(&output),
            }),
        }
    }
}
