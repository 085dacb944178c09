//! Error types for docsync-core

use docsync_nav::PagePath;

/// Result type for docsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a reconciliation run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid mode: {mode}")]
    InvalidMode { mode: String },

    #[error("Index topic {url} could not be retrieved: {source}")]
    IndexUnavailable {
        url: String,
        #[source]
        source: docsync_server::Error,
    },

    #[error("Topic for '{path}' could not be retrieved from {url}: {source}")]
    TopicUnavailable {
        path: PagePath,
        url: String,
        #[source]
        source: docsync_server::Error,
    },

    #[error("Expected branch '{expected}' to be checked out, found '{actual}'")]
    WrongBranch { expected: String, actual: String },

    // Transparent wrappers for underlying crate errors
    /// Navigation table error from docsync-nav
    #[error(transparent)]
    Nav(#[from] docsync_nav::Error),

    /// Filesystem error from docsync-fs
    #[error(transparent)]
    Fs(#[from] docsync_fs::Error),

    /// Repository error from docsync-git
    #[error(transparent)]
    Git(#[from] docsync_git::Error),

    /// Content server error from docsync-server
    #[error(transparent)]
    Server(#[from] docsync_server::Error),
}
