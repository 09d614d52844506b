//! End-to-end tests against real git and a stand-in kubectl script.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};

use assert_fs::prelude::*;
use tokio_util::sync::CancellationToken;

use simplesync::{GitCli, KubectlApplier, Reconciler, SyncConfig, SyncError};

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git").current_dir(dir).args(args).output().unwrap();
    assert!(output.status.success(), "git {:?}: {:?}", args, output);
}

fn remote_repo() -> assert_fs::TempDir {
    let remote = assert_fs::TempDir::new().unwrap();
    remote
        .child("manifests/a.yaml")
        .write_str("kind: Deployment\nname: web\n")
        .unwrap();
    remote
        .child("manifests/b.yaml")
        .write_str("kind: Namespace\nname: demo\n")
        .unwrap();
    remote
        .child("manifests/c.yaml")
        .write_str("kind: Widget\nname: gizmo\n")
        .unwrap();
    remote.child("README.md").write_str("# cluster\n").unwrap();

    git(remote.path(), &["init", "-q"]);
    git(remote.path(), &["config", "user.email", "test@test.com"]);
    git(remote.path(), &["config", "user.name", "Test"]);
    git(remote.path(), &["add", "."]);
    git(remote.path(), &["commit", "-q", "-m", "initial"]);
    remote
}

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn reconciler_for(remote: &Path, kubectl: &Path) -> Reconciler {
    let mut config = SyncConfig::new(format!("file://{}", remote.display()));
    config.kubectl_binary = kubectl.to_path_buf();

    let applier = KubectlApplier::new(&config.kubectl_binary);
    Reconciler::from_config(&config, Arc::new(GitCli::default()), Arc::new(applier)).unwrap()
}

#[tokio::test]
async fn test_real_git_applies_in_priority_order() {
    if !git_available() {
        return;
    }

    let remote = remote_repo();
    let tools = assert_fs::TempDir::new().unwrap();
    let log = tools.path().join("kubectl.log");
    let kubectl = script(
        tools.path(),
        "kubectl",
        &format!("echo \"$@\" >> '{}'", log.display()),
    );

    let mut reconciler = reconciler_for(remote.path(), &kubectl);
    let cancel = CancellationToken::new();
    reconciler.bootstrap(&cancel).await.unwrap();
    let report = reconciler.reconcile_once(&cancel).await.unwrap();
    assert_eq!(report.manifests_loaded, 3);

    let calls = std::fs::read_to_string(&log).unwrap();
    let files: Vec<&str> = calls
        .lines()
        .map(|line| {
            assert!(line.starts_with("apply -f "), "unexpected call: {}", line);
            line.rsplit('/').next().unwrap()
        })
        .collect();
    assert_eq!(files, vec!["b.yaml", "a.yaml", "c.yaml"]);

    let workdir = reconciler.mirror().local_path().to_path_buf();
    reconciler.shutdown().await.unwrap();
    assert!(!workdir.exists());
}

#[tokio::test]
async fn test_rejected_apply_carries_tool_output() {
    if !git_available() {
        return;
    }

    let remote = remote_repo();
    let tools = assert_fs::TempDir::new().unwrap();
    let kubectl = script(tools.path(), "kubectl", "echo 'error: unknown kind' >&2\nexit 1");

    let mut reconciler = reconciler_for(remote.path(), &kubectl);
    let cancel = CancellationToken::new();
    reconciler.bootstrap(&cancel).await.unwrap();

    let err = reconciler.reconcile_once(&cancel).await.unwrap_err();
    assert!(err.to_string().contains("error: unknown kind"));
    match err {
        SyncError::Apply { path, .. } => assert!(path.ends_with("manifests/b.yaml")),
        other => panic!("unexpected error: {:?}", other),
    }
    reconciler.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancellation_kills_in_flight_apply() {
    if !git_available() {
        return;
    }

    let remote = remote_repo();
    let tools = assert_fs::TempDir::new().unwrap();
    let kubectl = script(tools.path(), "kubectl", "exec sleep 30");

    let mut reconciler = reconciler_for(remote.path(), &kubectl);
    let cancel = CancellationToken::new();
    reconciler.bootstrap(&cancel).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = reconciler.reconcile_once(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(10));

    reconciler.shutdown().await.unwrap();
}
