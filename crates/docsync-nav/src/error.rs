//! Error types for docsync-nav

/// Result type for docsync-nav operations
pub type Result<T> = std::result::Result<T, Error>;

/// Validation errors raised while building or parsing a navigation table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Page path must contain at least one segment")]
    EmptyPath,

    #[error("Invalid slug '{slug}': {reason}")]
    InvalidSlug { slug: String, reason: String },

    #[error("Duplicate path '{path}' in navigation table")]
    DuplicatePath { path: String },

    #[error("Invalid nesting at line {line}: depth {depth} exceeds allowed depth {max}")]
    InvalidNesting { line: usize, depth: usize, max: usize },

    #[error("Parent of '{path}' is not in the navigation table")]
    MissingParent { path: String },

    #[error("Malformed navigation row at line {line}: {message}")]
    MalformedRow { line: usize, message: String },

    #[error("Navigation table header missing or malformed")]
    MissingHeader,

    #[error("Unexpected content after navigation table at line {line}")]
    TrailingContent { line: usize },
}

impl Error {
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            line,
            message: message.into(),
        }
    }
}
