//! GitOps reconciliation for simplesync.
//!
//! This module provides:
//! - A working-copy mirror of the tracked repository (clone, pull, cleanup)
//! - Manifest loading and apply ordering by resource kind
//! - The reconciler that runs pull → load → sort → apply passes
//! - The scheduler loop that drives passes until shutdown

pub mod apply;
pub mod command;
pub mod error;
pub mod git;
pub mod manifest;
pub mod priority;
pub mod reconciler;
pub mod store;
pub mod sync_scheduler;

pub use apply::{Applier, KubectlApplier};
pub use error::{ApplyError, LoadError, Result, SyncError, TransportError};
pub use git::{GitCli, PullOutcome, RepositoryMirror, Transport};
pub use manifest::{extract_identity, Document, Manifest};
pub use priority::{PriorityTable, DEFAULT_APPLY_ORDER, DEFAULT_PRIORITY, RESERVED_KIND};
pub use reconciler::{ReconcileReport, Reconciler, ReconcilerState};
pub use store::ManifestStore;
pub use sync_scheduler::{run, SyncScheduler};
