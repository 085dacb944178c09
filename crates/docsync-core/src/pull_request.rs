//! Conflicting edits and the pull request carrying them

use std::path::PathBuf;

use docsync_nav::PagePath;
use similar::TextDiff;

/// Title of the pull request opened for conflicting edits.
pub const PULL_REQUEST_TITLE: &str = "Documentation edits from the content server";

/// A page edited both locally and on the server since the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Conflicting page, or `None` for the index page intro.
    pub path: Option<PagePath>,
    pub url: String,
    /// File receiving the remote content, relative to the repository root.
    pub source: PathBuf,
    pub local: String,
    pub remote: String,
}

impl Conflict {
    /// Human name of the conflicting page.
    pub fn name(&self) -> String {
        match &self.path {
            Some(path) => path.to_string(),
            None => "index".to_string(),
        }
    }

    /// Unified diff from the local content to the remote content.
    pub fn diff(&self) -> String {
        let source = self.source.to_string_lossy();
        TextDiff::from_lines(self.local.as_str(), self.remote.as_str())
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{source}"), &format!("b/{source}"))
            .to_string()
    }
}

/// Pull request body listing every conflicting page with its diff.
pub fn pull_request_body(conflicts: &[Conflict]) -> String {
    let mut body = String::from(
        "Pages below were edited on the content server while they also changed \
         in this repository. This branch holds the server versions; merging it \
         adopts them, and the next run publishes the merged content.\n",
    );

    for conflict in conflicts {
        body.push_str(&format!(
            "\n### `{}` ({})\n\nSource: `{}`\n\n```diff\n{}```\n",
            conflict.name(),
            conflict.url,
            conflict.source.display(),
            conflict.diff()
        ));
    }
    body
}
