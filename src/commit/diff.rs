//! Diff resolution: decide which changes to describe and bound their size.
//!
//! The resolver inspects the staged diff, the unstaged diff and the porcelain
//! status, asks the caller to disambiguate when the working tree is in an
//! ambiguous state, flags dependency lock files, and finally enforces the
//! provider's diff length limit.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::GitError;
use crate::git::GitRunner;

/// Dependency lock files whose content is left out of the prompt.
///
/// Their presence is still reported to the model as a one-line note.
pub const LOCK_FILES: &[&str] = &[
    "Gemfile.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "Cargo.lock",
    "poetry.lock",
    "composer.lock",
];

/// Suffix of every lock file note.
const LOCK_NOTE_SUFFIX: &str = "updated (dependency changes)";

/// State of the working tree relative to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryDiffState {
    Clean,
    StagedOnly,
    UnstagedOnly,
    Mixed,
    UntrackedOnly,
}

impl RepositoryDiffState {
    /// Classify from raw staged diff, unstaged diff and porcelain status text.
    pub fn classify(staged: &str, unstaged: &str, status: &str) -> Self {
        Self::from_changes(
            !staged.trim().is_empty(),
            !unstaged.trim().is_empty(),
            !status.trim().is_empty(),
        )
    }

    /// Classify from whether the index, the working tree and the porcelain
    /// status each hold anything.
    pub fn from_changes(has_staged: bool, has_unstaged: bool, has_status: bool) -> Self {
        match (has_staged, has_unstaged) {
            (true, true) => RepositoryDiffState::Mixed,
            (true, false) => RepositoryDiffState::StagedOnly,
            (false, true) => RepositoryDiffState::UnstagedOnly,
            (false, false) if has_status => RepositoryDiffState::UntrackedOnly,
            (false, false) => RepositoryDiffState::Clean,
        }
    }

    /// The choices offered to the user in this state. Empty means no prompt.
    pub fn staging_actions(self) -> &'static [StagingAction] {
        match self {
            RepositoryDiffState::Mixed => &[
                StagingAction::StageAll,
                StagingAction::UseStaged,
                StagingAction::Abort,
            ],
            RepositoryDiffState::UnstagedOnly | RepositoryDiffState::UntrackedOnly => {
                &[StagingAction::StageAll, StagingAction::Abort]
            }
            RepositoryDiffState::Clean | RepositoryDiffState::StagedOnly => &[],
        }
    }
}

impl fmt::Display for RepositoryDiffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryDiffState::Clean => write!(f, "clean"),
            RepositoryDiffState::StagedOnly => write!(f, "staged only"),
            RepositoryDiffState::UnstagedOnly => write!(f, "unstaged only"),
            RepositoryDiffState::Mixed => write!(f, "staged and unstaged"),
            RepositoryDiffState::UntrackedOnly => write!(f, "untracked only"),
        }
    }
}

/// How to proceed when the index does not hold everything (or anything).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingAction {
    /// Run `git add .` and describe the resulting index.
    StageAll,
    /// Describe the index as it is.
    UseStaged,
    Abort,
}

/// How to proceed when the diff is longer than the provider's limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OversizeAction {
    Truncate,
    UseFull,
    Abort,
}

/// The choices offered for an oversized diff.
pub const OVERSIZE_ACTIONS: &[OversizeAction] = &[
    OversizeAction::Truncate,
    OversizeAction::UseFull,
    OversizeAction::Abort,
];

/// `--name-status` listings shown when both staged and unstaged changes exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileListing {
    /// Index only.
    pub staged: String,
    /// Working tree only.
    pub unstaged: String,
}

/// Semantic progress events for the caller to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveNotice {
    Clean,
    StagingAll,
    StillEmpty,
    Truncating { limit: usize },
    UsingFull { length: usize },
}

/// Interactive decisions the resolver delegates to its caller.
///
/// Returning `None` from a choice means the prompt was cancelled, which is
/// treated exactly like choosing `Abort`.
pub trait ResolvePrompter {
    fn choose_staging(
        &mut self,
        state: RepositoryDiffState,
        listing: Option<&FileListing>,
        actions: &[StagingAction],
    ) -> Option<StagingAction>;

    fn choose_oversize(
        &mut self,
        length: usize,
        limit: usize,
        actions: &[OversizeAction],
    ) -> Option<OversizeAction>;

    fn notify(&mut self, _notice: ResolveNotice) {}
}

/// The diff text that will be sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBundle {
    pub text: String,
    pub truncated: bool,
    /// Length in chars before any truncation, lock notes included.
    pub original_length: usize,
    pub lock_file_notes: Vec<String>,
}

/// Resolves the working tree into a single bounded diff.
pub struct DiffResolver<'a, G: GitRunner> {
    git: &'a G,
    excludes: Vec<String>,
}

impl<'a, G: GitRunner> DiffResolver<'a, G> {
    pub fn new(git: &'a G) -> Self {
        let excludes = LOCK_FILES
            .iter()
            .map(|name| format!(":(exclude,glob)**/{name}"))
            .collect();
        Self { git, excludes }
    }

    /// Resolve the diff to describe, bounded by `limit` characters.
    ///
    /// Returns `Ok(None)` when there is nothing to describe or the user
    /// aborted at any prompt. Errors only come from the git invocations.
    pub fn resolve(
        &self,
        limit: usize,
        prompter: &mut dyn ResolvePrompter,
    ) -> Result<Option<DiffBundle>, GitError> {
        let staged = self.staged_diff()?;
        let unstaged = self.with_excludes(&["diff", "--no-color"])?;
        let status = self.git.run(&["status", "--porcelain"])?;

        // Lock files count as changes even though their content is excluded.
        let staged_locks = self.changed_lock_files(true)?;
        let unstaged_locks = self.changed_lock_files(false)?;
        let has_staged = !staged.trim().is_empty() || !staged_locks.is_empty();

        let state = RepositoryDiffState::from_changes(
            has_staged,
            !unstaged.trim().is_empty() || !unstaged_locks.is_empty(),
            !status.trim().is_empty(),
        );
        debug!(%state, "Classified working tree");

        let staged = match state {
            RepositoryDiffState::Clean => {
                prompter.notify(ResolveNotice::Clean);
                return Ok(None);
            }
            RepositoryDiffState::StagedOnly => staged,
            RepositoryDiffState::Mixed
            | RepositoryDiffState::UnstagedOnly
            | RepositoryDiffState::UntrackedOnly => {
                let listing = match state {
                    RepositoryDiffState::Mixed => Some(self.file_listing()?),
                    _ => None,
                };

                match prompter.choose_staging(state, listing.as_ref(), state.staging_actions()) {
                    Some(StagingAction::StageAll) => {
                        prompter.notify(ResolveNotice::StagingAll);
                        self.git.run(&["add", "."])?;
                        let restaged = self.staged_diff()?;
                        if restaged.trim().is_empty()
                            && self.changed_lock_files(true)?.is_empty()
                        {
                            prompter.notify(ResolveNotice::StillEmpty);
                            return Ok(None);
                        }
                        restaged
                    }
                    Some(StagingAction::UseStaged) if has_staged => staged,
                    _ => return Ok(None),
                }
            }
        };

        let lock_file_notes = self.lock_file_notes()?;
        let text = if lock_file_notes.is_empty() {
            staged
        } else {
            format!("{}\n\n{}", lock_file_notes.join("\n"), staged)
        };

        let original_length = text.chars().count();
        if original_length <= limit {
            return Ok(Some(DiffBundle {
                text,
                truncated: false,
                original_length,
                lock_file_notes,
            }));
        }

        match prompter.choose_oversize(original_length, limit, OVERSIZE_ACTIONS) {
            Some(OversizeAction::Truncate) => {
                prompter.notify(ResolveNotice::Truncating { limit });
                Ok(Some(DiffBundle {
                    text: truncate_chars(&text, limit),
                    truncated: true,
                    original_length,
                    lock_file_notes,
                }))
            }
            Some(OversizeAction::UseFull) => {
                prompter.notify(ResolveNotice::UsingFull {
                    length: original_length,
                });
                Ok(Some(DiffBundle {
                    text,
                    truncated: false,
                    original_length,
                    lock_file_notes,
                }))
            }
            Some(OversizeAction::Abort) | None => Ok(None),
        }
    }

    fn staged_diff(&self) -> Result<String, GitError> {
        self.with_excludes(&["diff", "--cached", "--no-color"])
    }

    /// Lock files appear here too, so a lock-only side is not shown as empty.
    fn file_listing(&self) -> Result<FileListing, GitError> {
        Ok(FileListing {
            staged: self.git.run(&["diff", "--cached", "--name-status", "."])?,
            unstaged: self.git.run(&["diff", "--name-status", "."])?,
        })
    }

    /// Run a diff-style command over `.` with lock file content excluded.
    fn with_excludes(&self, base: &[&str]) -> Result<String, GitError> {
        let mut args: Vec<&str> = base.to_vec();
        args.push(".");
        args.extend(self.excludes.iter().map(String::as_str));
        self.git.run(&args)
    }

    /// Changed lock file paths in the index (`cached`) or the working tree.
    fn changed_lock_files(&self, cached: bool) -> Result<Vec<String>, GitError> {
        let output = if cached {
            self.git.run(&["diff", "--cached", "--name-only"])?
        } else {
            self.git.run(&["diff", "--name-only"])?
        };
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|path| is_lock_file(path))
            .map(str::to_string)
            .collect())
    }

    /// One note per changed lock file, across staged and unstaged changes.
    fn lock_file_notes(&self) -> Result<Vec<String>, GitError> {
        let mut seen = HashSet::new();
        Ok(self
            .changed_lock_files(true)?
            .into_iter()
            .chain(self.changed_lock_files(false)?)
            .filter(|path| seen.insert(path.clone()))
            .map(|path| format!("{path} {LOCK_NOTE_SUFFIX}"))
            .collect())
    }
}

/// Whether the file name component of `path` is a recognized lock file.
pub fn is_lock_file(path: &str) -> bool {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| LOCK_FILES.contains(&name))
}

/// Keep the first `limit` chars of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
