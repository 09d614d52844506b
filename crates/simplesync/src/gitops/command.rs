//! Cancellable external process execution.

use std::io;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Outcome of running an external command to completion or cancellation.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The process exited (successfully or not).
    Finished(Output),
    /// The token fired first and the process was killed.
    Cancelled,
}

/// Runs `cmd` with piped output, killing the child if `cancel` fires first.
///
/// Errors only when the process cannot be spawned.
pub async fn run_cancellable(
    mut cmd: Command,
    cancel: &CancellationToken,
) -> io::Result<CommandOutcome> {
    if cancel.is_cancelled() {
        return Ok(CommandOutcome::Cancelled);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    // Dropping the wait future drops the child, and kill_on_drop terminates it.
    tokio::select! {
        output = child.wait_with_output() => output.map(CommandOutcome::Finished),
        _ = cancel.cancelled() => Ok(CommandOutcome::Cancelled),
    }
}

/// Formats command output with both stderr and stdout for diagnostics.
pub fn format_output(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "Command failed with exit code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, true) => stderr,
        (false, false) => format!("{}\n{}", stderr, stdout),
    }
}
