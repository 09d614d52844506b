//! Local working copy of the tracked remote repository.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::transport::Transport;
use super::types::PullOutcome;
use crate::gitops::error::TransportError;

/// Prefix of the uniquely named working directory.
const WORKDIR_PREFIX: &str = "repo-";

/// Manages the process-exclusive working copy of `remote`.
pub struct RepositoryMirror {
    remote: String,
    local_path: PathBuf,
    transport: Arc<dyn Transport>,
}

impl RepositoryMirror {
    /// Allocates a fresh, uniquely named directory under the system temp dir.
    pub fn initialize(remote: impl Into<String>, transport: Arc<dyn Transport>) -> io::Result<Self> {
        Self::initialize_in(std::env::temp_dir(), remote, transport)
    }

    /// Allocates the working directory under `parent` instead of the system temp dir.
    pub fn initialize_in(
        parent: impl AsRef<Path>,
        remote: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> io::Result<Self> {
        let local_path = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(parent)?
            .keep();

        log::info!("Working directory created: {}", local_path.display());

        Ok(Self {
            remote: remote.into(),
            local_path,
            transport,
        })
    }

    /// Returns the remote location being tracked.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Returns the working copy path.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Shallow-clones the remote into the working copy.
    pub async fn clone_repo(&self, cancel: &CancellationToken) -> Result<(), TransportError> {
        log::info!("Cloning {} into {}", self.remote, self.local_path.display());
        self.transport
            .clone_repo(&self.remote, &self.local_path, cancel)
            .await
    }

    /// Pulls the latest remote state into the working copy.
    pub async fn pull(&self, cancel: &CancellationToken) -> Result<PullOutcome, TransportError> {
        log::info!("Pulling git updates");
        self.transport.pull(&self.local_path, cancel).await
    }

    /// Removes the working copy. An already-missing directory is not an error.
    pub async fn cleanup(&self) -> io::Result<()> {
        match tokio::fs::remove_dir_all(&self.local_path).await {
            Ok(()) => {
                log::info!("Working directory removed: {}", self.local_path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for RepositoryMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryMirror")
            .field("remote", &self.remote)
            .field("local_path", &self.local_path)
            .finish()
    }
}
