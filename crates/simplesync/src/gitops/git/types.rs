//! Pure data types for git operations.

use serde::{Deserialize, Serialize};

/// Result of a git pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullOutcome {
    /// Whether the working copy was already at the remote head.
    pub up_to_date: bool,
    /// Number of files changed by the pull.
    pub files_changed: u32,
}
