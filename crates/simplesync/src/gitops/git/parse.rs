//! Git output parsing helpers.

use super::types::PullOutcome;

/// Counts changed files from git pull output.
pub fn count_changed_files(output: &str) -> u32 {
    // Look for the diffstat summary, e.g. "3 files changed, 10 insertions(+)"
    for line in output.lines() {
        if line.contains("file") && line.contains("changed") {
            for word in line.split_whitespace() {
                if let Ok(n) = word.parse::<u32>() {
                    return n;
                }
            }
        }
    }
    0
}

/// Builds a pull outcome from git pull stdout.
pub fn parse_pull_output(stdout: &str) -> PullOutcome {
    let up_to_date = stdout.contains("Already up to date") || stdout.contains("Already up-to-date");

    PullOutcome {
        up_to_date,
        files_changed: if up_to_date {
            0
        } else {
            count_changed_files(stdout)
        },
    }
}
