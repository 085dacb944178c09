//! Error types for docsync-fs

use std::path::PathBuf;

/// Result type for docsync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docsync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config at {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Documentation directory not found: {path}")]
    DocsDirMissing { path: PathBuf },

    #[error("Invalid documentation page {path}: {message}")]
    InvalidPage { path: PathBuf, message: String },

    #[error("Two files map to the same page path '{path}'")]
    DuplicatePage { path: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
