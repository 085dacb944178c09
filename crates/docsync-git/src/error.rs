//! Error types for docsync-git

use std::path::PathBuf;

/// Result type for docsync-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docsync-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository at {path} has no working directory")]
    BareRepository { path: PathBuf },

    #[error("HEAD is detached; a branch must be checked out")]
    DetachedHead,

    #[error("Branch '{name}' not found")]
    BranchNotFound { name: String },

    #[error("Remote '{name}' not found")]
    RemoteNotFound { name: String },

    #[error("Push failed: {message}")]
    PushFailed { message: String },

    #[error("Pull failed: {message}")]
    PullFailed { message: String },

    #[error("Cannot fast-forward: {message}")]
    CannotFastForward { message: String },

    #[error("Cannot switch to '{branch}' without losing uncommitted changes: {message}")]
    UncommittedChanges { branch: String, message: String },

    #[error("Invalid object id '{id}'")]
    InvalidObjectId { id: String },

    #[error("No pull request host configured")]
    NoPullRequestHost,

    #[error("Pull request #{number} from '{head}' into '{base}' is already open")]
    PullRequestExists {
        number: u64,
        head: String,
        base: String,
    },

    #[error("Pull request #{number} not found")]
    PullRequestNotFound { number: u64 },

    #[error("Pull request host request failed: {message}")]
    Host { message: String },

    #[error("Pull request host returned {status}: {message}")]
    HostResponse { status: u16, message: String },
}

impl Error {
    pub(crate) fn host(error: impl std::fmt::Display) -> Self {
        Self::Host {
            message: error.to_string(),
        }
    }
}
