//! Values exchanged with the repository client

use serde::{Deserialize, Serialize};

/// Name of the tag marking the last fully reconciled commit.
pub const BASE_TAG_NAME: &str = "docsync/base-content";

/// Branch carrying remote edits that conflict with local ones.
pub const FEATURE_BRANCH_NAME: &str = "docsync/update";

/// Prefix of the tag message line holding the index checksum.
const CHECKSUM_PREFIX: &str = "index-checksum: ";

/// The base-content marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    /// Commit id the tag points at.
    pub commit: String,
    /// Checksum of the index page body written at `commit`.
    pub index_checksum: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, commit: impl Into<String>, index_checksum: Option<String>) -> Self {
        Self {
            name: name.into(),
            commit: commit.into(),
            index_checksum,
        }
    }

    /// Annotated tag message recording the checksum.
    pub fn message(&self) -> String {
        match &self.index_checksum {
            Some(checksum) => format!("docsync base content\n\n{CHECKSUM_PREFIX}{checksum}\n"),
            None => "docsync base content\n".to_string(),
        }
    }

    /// Extract the checksum from an annotated tag message.
    pub fn checksum_from_message(message: &str) -> Option<String> {
        message
            .lines()
            .find_map(|line| line.trim().strip_prefix(CHECKSUM_PREFIX))
            .map(|checksum| checksum.trim().to_string())
            .filter(|checksum| !checksum.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub head: String,
    pub base: String,
    pub state: PullRequestState,
    pub merged: bool,
    pub url: Option<String>,
}

impl PullRequest {
    pub fn is_open(&self) -> bool {
        self.state == PullRequestState::Open
    }
}
