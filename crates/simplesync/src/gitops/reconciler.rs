//! Reconciler: pull → load → sort → apply.
//!
//! Owns the working copy and the manifest store. Each pass runs its stages
//! in strict order and stops at the first failure; retries are left to the
//! scheduler's next tick.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::apply::Applier;
use super::error::{ApplyError, Result, SyncError};
use super::git::{PullOutcome, RepositoryMirror, Transport};
use super::priority::PriorityTable;
use super::store::ManifestStore;
use crate::config::SyncConfig;

/// Lifecycle of a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcilerState {
    /// Working directory allocated, nothing cloned yet.
    Uninitialized,
    /// Working copy present and idle between passes.
    Cloned,
    /// Pulling and loading manifests.
    Syncing,
    /// Submitting manifests to the cluster.
    Applying,
    /// Working copy released.
    Closed,
}

impl std::fmt::Display for ReconcilerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilerState::Uninitialized => write!(f, "uninitialized"),
            ReconcilerState::Cloned => write!(f, "cloned"),
            ReconcilerState::Syncing => write!(f, "syncing"),
            ReconcilerState::Applying => write!(f, "applying"),
            ReconcilerState::Closed => write!(f, "closed"),
        }
    }
}

/// Summary of one successful reconciliation pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Result of the pull stage.
    pub pull: PullOutcome,
    /// Number of manifests found in the working copy.
    pub manifests_loaded: usize,
    /// Applied manifests in apply order, relative to the working copy.
    pub applied: Vec<PathBuf>,
}

impl ReconcileReport {
    /// Wall-clock duration of the pass.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Drives reconciliation passes against one tracked repository.
pub struct Reconciler {
    mirror: RepositoryMirror,
    store: ManifestStore,
    applier: Arc<dyn Applier>,
    manifests_dir: PathBuf,
    state: ReconcilerState,
}

impl Reconciler {
    /// Creates a reconciler over an initialized mirror.
    ///
    /// `manifests_dir` is relative to the working copy.
    pub fn new(
        mirror: RepositoryMirror,
        store: ManifestStore,
        applier: Arc<dyn Applier>,
        manifests_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mirror,
            store,
            applier,
            manifests_dir: manifests_dir.into(),
            state: ReconcilerState::Uninitialized,
        }
    }

    /// Allocates the working directory and wires the configured collaborators.
    pub fn from_config(
        config: &SyncConfig,
        transport: Arc<dyn Transport>,
        applier: Arc<dyn Applier>,
    ) -> Result<Self> {
        let mirror = RepositoryMirror::initialize(config.repository.clone(), transport)
            .map_err(SyncError::WorkDir)?;
        let table = match &config.apply_order {
            Some(order) => PriorityTable::with_order(order.iter().cloned()),
            None => PriorityTable::default(),
        };

        Ok(Self::new(
            mirror,
            ManifestStore::new(table),
            applier,
            config.manifests_dir.clone(),
        ))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    /// The working copy.
    pub fn mirror(&self) -> &RepositoryMirror {
        &self.mirror
    }

    /// Manifests loaded by the most recent successful reload.
    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Absolute path of the manifests directory inside the working copy.
    pub fn manifests_root(&self) -> PathBuf {
        self.mirror.local_path().join(&self.manifests_dir)
    }

    /// Performs the initial clone. Failure here is fatal to the process.
    pub async fn bootstrap(&mut self, cancel: &CancellationToken) -> Result<()> {
        match self.state {
            ReconcilerState::Uninitialized => {}
            ReconcilerState::Closed => return Err(SyncError::Closed),
            _ => return Ok(()),
        }

        self.mirror.clone_repo(cancel).await.map_err(|e| {
            error!(stage = "clone", remote = %self.mirror.remote(), error = %e, "Failed to clone repository");
            SyncError::Clone(e)
        })?;

        info!(remote = %self.mirror.remote(), path = %self.mirror.local_path().display(), "Repository cloned");
        self.state = ReconcilerState::Cloned;
        Ok(())
    }

    /// Runs one pull → load → apply pass, stopping at the first failure.
    pub async fn reconcile_once(&mut self, cancel: &CancellationToken) -> Result<ReconcileReport> {
        match self.state {
            ReconcilerState::Uninitialized => return Err(SyncError::NotBootstrapped),
            ReconcilerState::Closed => return Err(SyncError::Closed),
            _ => {}
        }

        let span = info_span!("reconcile", remote = %self.mirror.remote());
        let result = self.run_pass(cancel).instrument(span).await;
        self.state = ReconcilerState::Cloned;

        if let Err(e) = &result {
            if e.is_cancelled() {
                warn!(stage = e.stage(), "Reconciliation pass cancelled");
            } else {
                error!(stage = e.stage(), error = %e, "Reconciliation pass failed");
            }
        }
        result
    }

    async fn run_pass(&mut self, cancel: &CancellationToken) -> Result<ReconcileReport> {
        let started_at = Utc::now();

        self.state = ReconcilerState::Syncing;
        let pull = self.mirror.pull(cancel).await.map_err(SyncError::Pull)?;
        info!(
            up_to_date = pull.up_to_date,
            files_changed = pull.files_changed,
            "Pull completed"
        );

        let root = self.manifests_root();
        let manifests_loaded = self.store.reload(&root)?;
        info!(count = manifests_loaded, "Loaded manifests");

        self.state = ReconcilerState::Applying;
        let workdir = self.mirror.local_path().to_path_buf();
        let mut applied = Vec::with_capacity(manifests_loaded);

        for manifest in self.store.sorted_documents() {
            let path = manifest.path();
            let relative = relative_to(path, &workdir);

            if cancel.is_cancelled() {
                return Err(SyncError::Apply {
                    path: path.to_path_buf(),
                    source: ApplyError::Cancelled,
                });
            }

            info!(
                path = %relative.display(),
                kind = manifest.kind(),
                name = manifest.name(),
                "Applying manifest"
            );

            let output = self
                .applier
                .apply(path, &workdir, cancel)
                .await
                .map_err(|source| SyncError::Apply {
                    path: path.to_path_buf(),
                    source,
                })?;
            if !output.is_empty() {
                debug!(path = %relative.display(), output = %output, "Apply output");
            }

            applied.push(relative);
        }

        let report = ReconcileReport {
            started_at,
            finished_at: Utc::now(),
            pull,
            manifests_loaded,
            applied,
        };
        info!(
            applied = report.applied.len(),
            duration_ms = report.duration().num_milliseconds(),
            "Reconciliation pass completed"
        );
        Ok(report)
    }

    /// Releases the working copy. Cleanup failures are logged and returned,
    /// never fatal. Calling it again after a successful close is a no-op.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.state == ReconcilerState::Closed {
            debug!("Reconciler already closed");
            return Ok(());
        }

        self.state = ReconcilerState::Closed;
        match self.mirror.cleanup().await {
            Ok(()) => {
                info!("Reconciler shut down");
                Ok(())
            }
            Err(source) => {
                error!(
                    path = %self.mirror.local_path().display(),
                    error = %source,
                    "Failed to clean up working directory"
                );
                Err(SyncError::Cleanup {
                    path: self.mirror.local_path().to_path_buf(),
                    source,
                })
            }
        }
    }
}

fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).unwrap_or(path).to_path_buf()
}
