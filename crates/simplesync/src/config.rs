//! Runtime configuration and command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the scheduler does after a failed reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and retry on the next tick.
    #[default]
    Continue,
    /// Clean up and exit with a non-zero status.
    Exit,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Reconciler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Remote repository URL or path.
    pub repository: String,

    /// Seconds between reconciliation passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Manifests directory, relative to the working copy.
    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    #[serde(default = "default_git_binary")]
    pub git_binary: PathBuf,

    #[serde(default = "default_kubectl_binary")]
    pub kubectl_binary: PathBuf,

    /// Kubeconfig context passed to kubectl.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_context: Option<String>,

    /// Validate manifests client-side without applying them.
    #[serde(default)]
    pub dry_run: bool,

    /// Overrides the built-in apply order of resource kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_order: Option<Vec<String>>,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_interval_secs() -> u64 {
    10
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from("manifests")
}

fn default_git_binary() -> PathBuf {
    PathBuf::from("git")
}

fn default_kubectl_binary() -> PathBuf {
    PathBuf::from("kubectl")
}

/// Errors from configuration validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Repository location must not be empty")]
    EmptyRepository,

    #[error("Sync interval must be greater than zero")]
    ZeroInterval,

    #[error("Apply order must not be empty")]
    EmptyApplyOrder,
}

impl SyncConfig {
    /// Creates a configuration with defaults for everything but the repository.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            interval_secs: default_interval_secs(),
            manifests_dir: default_manifests_dir(),
            on_failure: FailurePolicy::default(),
            git_binary: default_git_binary(),
            kubectl_binary: default_kubectl_binary(),
            kube_context: None,
            dry_run: false,
            apply_order: None,
            log_format: LogFormat::default(),
        }
    }

    /// Tick interval of the scheduler.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Checks values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.trim().is_empty() {
            return Err(ConfigError::EmptyRepository);
        }
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if matches!(&self.apply_order, Some(order) if order.is_empty()) {
            return Err(ConfigError::EmptyApplyOrder);
        }
        Ok(())
    }
}

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "simplesync", version, about = "Minimal GitOps reconciler")]
pub struct Cli {
    /// Repository to track (URL or local path).
    pub repository: String,

    /// Seconds between reconciliation passes.
    #[arg(long, env = "SIMPLESYNC_INTERVAL", default_value_t = default_interval_secs())]
    pub interval: u64,

    /// Manifests directory inside the repository.
    #[arg(long, env = "SIMPLESYNC_MANIFESTS_DIR", default_value = "manifests")]
    pub manifests_dir: PathBuf,

    /// Behaviour after a failed pass.
    #[arg(long, env = "SIMPLESYNC_ON_FAILURE", value_enum, default_value_t = FailurePolicy::Continue)]
    pub on_failure: FailurePolicy,

    /// git executable.
    #[arg(long, env = "SIMPLESYNC_GIT", default_value = "git")]
    pub git: PathBuf,

    /// kubectl executable.
    #[arg(long, env = "SIMPLESYNC_KUBECTL", default_value = "kubectl")]
    pub kubectl: PathBuf,

    /// Kubeconfig context to apply against.
    #[arg(long, env = "SIMPLESYNC_KUBE_CONTEXT")]
    pub kube_context: Option<String>,

    /// Validate manifests client-side without applying them.
    #[arg(long, env = "SIMPLESYNC_DRY_RUN")]
    pub dry_run: bool,

    /// Comma-separated apply order of resource kinds.
    #[arg(long, env = "SIMPLESYNC_APPLY_ORDER", value_delimiter = ',')]
    pub apply_order: Option<Vec<String>>,

    /// Log output format.
    #[arg(long, env = "SIMPLESYNC_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl From<Cli> for SyncConfig {
    fn from(cli: Cli) -> Self {
        Self {
            repository: cli.repository,
            interval_secs: cli.interval,
            manifests_dir: cli.manifests_dir,
            on_failure: cli.on_failure,
            git_binary: cli.git,
            kubectl_binary: cli.kubectl,
            kube_context: cli.kube_context,
            dry_run: cli.dry_run,
            apply_order: cli.apply_order,
            log_format: cli.log_format,
        }
    }
}
