//! Error types for the reconciliation pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors reported by the repository transport (clone/pull).
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Git network error: {0}")]
    Network(String),

    #[error("Git authentication failed: {0}")]
    AuthFailed(String),

    #[error("Git remote not found: {0}")]
    RemoteNotFound(String),

    #[error("Git operation failed: {0}")]
    Operation(String),

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Git operation cancelled")]
    Cancelled,
}

impl TransportError {
    /// Returns true if the failure is likely to clear up on its own by the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Network(_))
    }
}

/// Classifies a git stderr string into a more specific error variant.
pub fn classify_git_error(stderr: &str) -> TransportError {
    let lower = stderr.to_lowercase();
    let message = stderr.trim().to_string();

    if lower.contains("could not resolve host")
        || lower.contains("connection refused")
        || lower.contains("connection timed out")
        || lower.contains("network is unreachable")
        || lower.contains("failed to connect")
        || lower.contains("couldn't connect to server")
        || lower.contains("the remote end hung up unexpectedly")
    {
        return TransportError::Network(message);
    }

    if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("invalid credentials")
        || lower.contains("could not read username")
    {
        return TransportError::AuthFailed(message);
    }

    if lower.contains("does not exist")
        || lower.contains("repository not found")
        || lower.contains("does not appear to be a git repository")
    {
        return TransportError::RemoteNotFound(message);
    }

    TransportError::Operation(message)
}

/// Errors raised while loading manifests from the working copy.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Manifests directory not found: {0}")]
    ManifestsDirNotFound(PathBuf),

    #[error("Failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

/// Errors reported by the apply capability.
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Manifest '{path}' was rejected: {output}")]
    Rejected { path: PathBuf, output: String },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Apply cancelled")]
    Cancelled,
}

/// Top-level errors of the reconciler, tagged by stage.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to allocate working directory: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("Failed to clone repository: {0}")]
    Clone(#[source] TransportError),

    #[error("Failed to pull repository: {0}")]
    Pull(#[source] TransportError),

    #[error("Failed to load manifests: {0}")]
    Load(#[from] LoadError),

    #[error("Failed to apply manifest '{path}': {source}")]
    Apply {
        path: PathBuf,
        #[source]
        source: ApplyError,
    },

    #[error("Repository has not been cloned yet")]
    NotBootstrapped,

    #[error("Reconciler is closed")]
    Closed,

    #[error("Failed to remove working directory '{path}': {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Name of the stage that failed, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            SyncError::Config(_) => "config",
            SyncError::WorkDir(_) => "workdir",
            SyncError::Clone(_) => "clone",
            SyncError::Pull(_) => "pull",
            SyncError::Load(_) => "load",
            SyncError::Apply { .. } => "apply",
            SyncError::NotBootstrapped | SyncError::Closed => "state",
            SyncError::Cleanup { .. } => "cleanup",
        }
    }

    /// Returns true if the failure was caused by cancellation rather than the operation itself.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            SyncError::Clone(TransportError::Cancelled)
                | SyncError::Pull(TransportError::Cancelled)
                | SyncError::Apply {
                    source: ApplyError::Cancelled,
                    ..
                }
        )
    }
}

/// Result type for reconciler operations.
pub type Result<T> = std::result::Result<T, SyncError>;
