//! Local documentation pages

use std::path::PathBuf;

use crate::PagePath;

/// A page of the local documentation tree.
///
/// Group pages are pure category headers: they have no content, no source
/// file and never a remote topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: PagePath,
    pub title: String,
    pub content: String,
    pub is_group: bool,
    /// File backing the page, relative to the repository root.
    pub source: Option<PathBuf>,
}

impl Page {
    /// A category header.
    pub fn group(path: PagePath, title: impl Into<String>) -> Self {
        Self {
            path,
            title: title.into(),
            content: String::new(),
            is_group: true,
            source: None,
        }
    }

    /// A page with content read from `source`.
    pub fn document(
        path: PagePath,
        title: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path,
            title: title.into(),
            content: content.into(),
            is_group: false,
            source: Some(source.into()),
        }
    }
}
