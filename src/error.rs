//! Error types for aicm modules using thiserror.

use thiserror::Error;

/// Errors from running the git binary.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git was not found in PATH. Install git to use aicm.")]
    NotInstalled,

    #[error("Not a git repository: {0}")]
    NotARepository(#[source] git2::Error),

    #[error("Bare repositories are not supported")]
    BareRepository,

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} exited with {}: {stderr}",
             code.map_or("unknown status".to_string(), |c| format!("code {c}")))]
    CommandFailed {
        operation: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// Errors from reading or writing the provider configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the home directory for the config files")]
    NoHomeDirectory,

    #[error("Configuration not found at {0}. Default config generated; fill in a provider and re-run.")]
    NotFound(String),

    #[error("No active provider configured. Set `active_provider` and its `api_key` in the config.")]
    NotConfigured,

    #[error("Provider '{0}' has no model selected. Set `model` for it in the config.")]
    MissingModel(String),

    #[error("Provider '{0}' has no base_url")]
    MissingBaseUrl(String),

    #[error("Provider '{0}' not found in config")]
    UnknownProvider(String),

    #[error("Failed to read config {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[source] serde_yaml::Error),
}

/// Errors from listing models on a provider.
#[derive(Error, Debug)]
pub enum ModelListError {
    #[error("Failed to reach {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch models: HTTP {status}")]
    Http { status: u16 },

    #[error("Unexpected model list response: {0}")]
    InvalidResponse(String),
}
