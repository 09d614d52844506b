//! Shared test utilities for simplesync integration tests.
//!
//! This module provides recording fakes for the transport and apply
//! capabilities. Both push into a shared event log so tests can assert
//! the exact order of external calls.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use simplesync::gitops::{
    ApplyError, ManifestStore, PullOutcome, Reconciler, RepositoryMirror, TransportError,
};
use simplesync::{Applier, Transport};

/// Ordered log of external calls.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Scripted behaviour of one pull.
#[derive(Debug, Clone)]
pub enum PullStep {
    Succeed,
    Fail(String),
    /// Write a file into the working copy, then succeed.
    Write(String, String),
    /// Remove a file from the working copy, then succeed.
    Remove(String),
    /// Wait until cancelled.
    Block,
}

/// Transport that materializes a fixed tree on clone and follows a pull script.
pub struct FakeTransport {
    files: Vec<(String, String)>,
    clone_fails: bool,
    clone_blocks: bool,
    pulls: Mutex<VecDeque<PullStep>>,
    events: EventLog,
    clone_dest: Mutex<Option<PathBuf>>,
}

impl FakeTransport {
    pub fn new(events: EventLog, files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(p, c)| (p.to_string(), c.to_string()))
                .collect(),
            clone_fails: false,
            clone_blocks: false,
            pulls: Mutex::new(VecDeque::new()),
            events,
            clone_dest: Mutex::new(None),
        }
    }

    pub fn failing_clone(mut self) -> Self {
        self.clone_fails = true;
        self
    }

    /// Clone waits until cancelled.
    pub fn blocking_clone(mut self) -> Self {
        self.clone_blocks = true;
        self
    }

    pub fn script(self, steps: Vec<PullStep>) -> Self {
        *self.pulls.lock().unwrap() = steps.into();
        self
    }

    pub fn clone_dest(&self) -> Option<PathBuf> {
        self.clone_dest.lock().unwrap().clone()
    }
}

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[async_trait]
impl Transport for FakeTransport {
    async fn clone_repo(
        &self,
        _remote: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), TransportError> {
        self.events.lock().unwrap().push("clone".to_string());
        *self.clone_dest.lock().unwrap() = Some(dest.to_path_buf());

        if self.clone_blocks {
            cancel.cancelled().await;
            return Err(TransportError::Cancelled);
        }
        if self.clone_fails {
            return Err(TransportError::RemoteNotFound("fake remote".to_string()));
        }
        for (relative, content) in &self.files {
            write_file(dest, relative, content);
        }
        Ok(())
    }

    async fn pull(
        &self,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PullOutcome, TransportError> {
        self.events.lock().unwrap().push("pull".to_string());
        let step = self
            .pulls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PullStep::Succeed);

        match step {
            PullStep::Succeed => Ok(PullOutcome {
                up_to_date: true,
                files_changed: 0,
            }),
            PullStep::Fail(message) => Err(TransportError::Network(message)),
            PullStep::Write(relative, content) => {
                write_file(workdir, &relative, &content);
                Ok(PullOutcome {
                    up_to_date: false,
                    files_changed: 1,
                })
            }
            PullStep::Remove(relative) => {
                std::fs::remove_file(workdir.join(relative)).unwrap();
                Ok(PullOutcome {
                    up_to_date: false,
                    files_changed: 1,
                })
            }
            PullStep::Block => {
                cancel.cancelled().await;
                Err(TransportError::Cancelled)
            }
        }
    }
}

/// Applier that records every call and can fail or block on a given file name.
pub struct FakeApplier {
    events: EventLog,
    fail_on: Option<String>,
    block_on: Option<String>,
}

impl FakeApplier {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            fail_on: None,
            block_on: None,
        }
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.fail_on = Some(file_name.to_string());
        self
    }

    pub fn blocking_on(mut self, file_name: &str) -> Self {
        self.block_on = Some(file_name.to_string());
        self
    }
}

#[async_trait]
impl Applier for FakeApplier {
    async fn apply(
        &self,
        manifest: &Path,
        _workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, ApplyError> {
        let name = manifest
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.events.lock().unwrap().push(format!("apply:{}", name));

        if self.block_on.as_deref() == Some(name.as_str()) {
            cancel.cancelled().await;
            return Err(ApplyError::Cancelled);
        }
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(ApplyError::Rejected {
                path: manifest.to_path_buf(),
                output: "error: admission webhook denied the request".to_string(),
            });
        }
        Ok(format!("{} configured", name))
    }
}

/// A reconciler wired to fakes, with its working directory under a temp dir.
pub struct Harness {
    pub parent: TempDir,
    pub events: EventLog,
    pub transport: Arc<FakeTransport>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new(
        transport: impl FnOnce(EventLog) -> FakeTransport,
        applier: impl FnOnce(EventLog) -> FakeApplier,
    ) -> Self {
        let parent = TempDir::new().expect("Failed to create temp directory");
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));
        let transport = Arc::new(transport(events.clone()));
        let applier = Arc::new(applier(events.clone()));

        let mirror = RepositoryMirror::initialize_in(parent.path(), "file:///fake", transport.clone())
            .expect("Failed to allocate working directory");
        let reconciler = Reconciler::new(mirror, ManifestStore::default(), applier, "manifests");

        Self {
            parent,
            events,
            transport,
            reconciler,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// The three-file working copy used by the end-to-end scenario.
pub const SCENARIO: &[(&str, &str)] = &[
    ("manifests/a.yaml", "kind: Deployment\nname: web\n"),
    ("manifests/b.yaml", "kind: Namespace\nname: demo\n"),
    ("manifests/c.yaml", "kind: Widget\nname: gizmo\n"),
];
