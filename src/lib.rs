//! aicm - AI commit messages from local changes.
//!
//! # Overview
//!
//! aicm resolves the working tree into a bounded diff, streams a one-line
//! commit message from an OpenAI-compatible chat-completion endpoint, and
//! lets the user commit, regenerate or edit the result.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod ui;

// Re-export commonly used types
pub use commit::{CommitFormat, DiffBundle, DiffResolver, RepositoryDiffState};
pub use config::{ProviderConfig, ProviderStore, YamlConfigStore};
pub use error::{ConfigError, GitError, ModelListError};
pub use git::{GitRunner, SystemGit};
pub use llm::{CompletionClient, GenerationResult, RetryReason};
