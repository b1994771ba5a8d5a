//! AI-generated commit messages: diff resolution, prompts and the commit step.

pub mod diff;
pub mod message;
pub mod prompt;

pub use diff::{
    DiffBundle, DiffResolver, FileListing, LOCK_FILES, OVERSIZE_ACTIONS, OversizeAction,
    RepositoryDiffState, ResolveNotice, ResolvePrompter, StagingAction,
};
pub use message::{commit_staged, extract_candidate};
pub use prompt::{CommitFormat, build_system_prompt, build_user_prompt};
