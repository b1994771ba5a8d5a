//! Process invoker for the system `git` binary.
//!
//! Everything the resolver and the commit step need from the repository goes
//! through `git` itself, inheriting the user's config, attributes and hooks.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use tracing::debug;

use crate::error::GitError;

/// Runs git subcommands and returns their standard output.
///
/// This abstraction allows scripting repository states in tests.
pub trait GitRunner {
    /// Run `git <args>` and return stdout with trailing newlines removed.
    fn run(&self, args: &[&str]) -> Result<String, GitError>;
}

/// Runs the real `git` binary inside a fixed working directory.
#[derive(Debug, Clone)]
pub struct SystemGit {
    workdir: PathBuf,
}

impl SystemGit {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Locate the repository containing `start` and run git from its root.
    ///
    /// Fails with [`GitError::NotInstalled`] when no `git` executable is on
    /// PATH, so callers can report "feature unavailable" up front.
    pub fn discover(start: &Path) -> Result<Self, GitError> {
        if which::which("git").is_err() {
            return Err(GitError::NotInstalled);
        }

        let repo = Repository::discover(start).map_err(GitError::NotARepository)?;
        let workdir = repo.workdir().ok_or(GitError::BareRepository)?;
        Ok(Self::new(workdir))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl GitRunner for SystemGit {
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let operation = args.first().copied().unwrap_or_default().to_string();
        debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .current_dir(&self.workdir)
            .args(args)
            .output()
            .map_err(|source| GitError::SpawnFailed {
                operation: operation.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                operation,
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end_matches(['\n', '\r']).to_string())
    }
}
