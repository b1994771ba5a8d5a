//! Commit message post-processing and the git commit itself.

use crate::error::GitError;
use crate::git::GitRunner;

const QUOTES: [char; 2] = ['"', '\''];

/// Turn the raw content accumulator into a single-line commit message.
///
/// Takes the first non-blank line, trims it, and drops one leading and one
/// trailing quote character if the model wrapped its answer. Returns `None`
/// when nothing usable is left. Applying it to its own output is a no-op for
/// any message that does not itself start or end with a quote.
pub fn extract_candidate(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;

    let line = line.strip_prefix(QUOTES).unwrap_or(line);
    let line = line.strip_suffix(QUOTES).unwrap_or(line);
    let line = line.trim();

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

/// Commit the index with `message` exactly as given.
///
/// Returns the `git log -1` output describing the new commit.
pub fn commit_staged<G: GitRunner>(git: &G, message: &str) -> Result<String, GitError> {
    git.run(&["commit", "-m", message])?;
    git.run(&["log", "-1"])
}
