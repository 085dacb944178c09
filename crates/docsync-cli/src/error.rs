//! Error types for docsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from docsync-core
    #[error(transparent)]
    Core(#[from] docsync_core::Error),

    /// Error from docsync-fs
    #[error(transparent)]
    Fs(#[from] docsync_fs::Error),

    /// Error from docsync-git
    #[error(transparent)]
    Git(#[from] docsync_git::Error),

    /// Error from docsync-server
    #[error(transparent)]
    Server(#[from] docsync_server::Error),

    /// JSON output or `--urls` input error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_user() {
        let error = CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }
}
