//! Outcomes of a reconciliation run

use std::collections::BTreeMap;
use std::fmt;

use docsync_git::{PullRequest, Tag};
use docsync_nav::PagePath;
use serde::Serialize;

use crate::plan::{Mode, ReconciliationAction};

/// Kind of a planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    DeleteTopic,
    RemoveRow,
}

impl From<&ReconciliationAction> for ActionKind {
    fn from(action: &ReconciliationAction) -> Self {
        match action {
            ReconciliationAction::Create { .. } => Self::Create,
            ReconciliationAction::Update { .. } => Self::Update,
            ReconciliationAction::DeleteTopic { .. } => Self::DeleteTopic,
            ReconciliationAction::RemoveRow { .. } => Self::RemoveRow,
        }
    }
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { url: Option<String> },
    Updated { url: Option<String> },
    RowRemoved { url: Option<String> },
    Deleted { url: String },
    /// The remote edit was written into the local tree.
    Pulled { url: String },
    /// Local and remote edits collide; the remote side went to a pull request.
    Conflict {
        url: String,
        pull_request: Option<u64>,
    },
    Skipped { reason: String },
    Failed { error: String },
    Planned {
        action: ActionKind,
        url: Option<String>,
    },
}

impl Outcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Created { url } | Self::Updated { url } | Self::RowRemoved { url } => {
                url.as_deref()
            }
            Self::Planned { url, .. } => url.as_deref(),
            Self::Deleted { url } | Self::Pulled { url } | Self::Conflict { url, .. } => Some(url),
            Self::Skipped { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::RowRemoved { .. } => "row_removed",
            Self::Deleted { .. } => "deleted",
            Self::Pulled { .. } => "pulled",
            Self::Conflict { .. } => "conflict",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
            Self::Planned { .. } => "planned",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Skipped { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
            Self::Planned { action, .. } => write!(f, "planned {action:?}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Where the conflict workflow ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    /// No divergence from the baseline that needs review.
    Clean,
    /// Conflicts were found but the feature branch could not be published.
    Diverged,
    /// The feature branch was pushed but no pull request could be opened.
    Branched,
    /// A pull request is open for review.
    PrPending,
    /// The previous pull request was merged and adopted this run.
    Merged,
    /// The previous pull request was closed unmerged and its branch deleted.
    Abandoned,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clean => "clean",
            Self::Diverged => "diverged",
            Self::Branched => "branched",
            Self::PrPending => "pull request pending",
            Self::Merged => "merged",
            Self::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// Result of [`reconcile`](crate::reconcile).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: Mode,
    pub state: CoordinatorState,
    pub outcomes: BTreeMap<PagePath, Outcome>,
    pub index_url: Option<String>,
    /// Whether the index topic was created or rewritten.
    pub index_changed: bool,
    /// Whether the index intro was edited on both sides.
    pub index_conflict: bool,
    /// Commit made on the base branch, if any.
    pub commit: Option<String>,
    /// Base-content tag after the run.
    pub tag: Option<Tag>,
    pub pull_request: Option<PullRequest>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        self.outcomes.values().any(Outcome::is_failure)
    }

    pub fn conflicts(&self) -> usize {
        let pages = self
            .outcomes
            .values()
            .filter(|o| matches!(o, Outcome::Conflict { .. }))
            .count();
        pages + usize::from(self.index_conflict)
    }

    /// Topic URL to outcome label, including the index topic.
    pub fn urls_with_actions(&self) -> BTreeMap<String, String> {
        let mut urls: BTreeMap<String, String> = self
            .outcomes
            .values()
            .filter_map(|outcome| Some((outcome.url()?.to_string(), outcome.label().to_string())))
            .collect();

        if let Some(url) = &self.index_url {
            let label = if self.index_changed { "index_updated" } else { "index" };
            urls.insert(url.clone(), label.to_string());
        }
        urls
    }
}
