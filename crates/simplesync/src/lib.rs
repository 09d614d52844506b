pub mod config;
pub mod gitops;
pub mod logging;
pub mod signal;

pub use config::{Cli, ConfigError, FailurePolicy, LogFormat, SyncConfig};
pub use gitops::{
    Applier, GitCli, KubectlApplier, Manifest, ManifestStore, PriorityTable, ReconcileReport,
    Reconciler, ReconcilerState, RepositoryMirror, SyncError, SyncScheduler, Transport,
};
