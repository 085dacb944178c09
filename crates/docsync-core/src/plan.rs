//! Reconciliation planner
//!
//! Diffs the local tree against the server index. Creates and updates follow
//! the local depth-first order so parents exist before their children;
//! removals come last, in reverse table order so children go before parents.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use docsync_nav::{NavigationRow, Page, PagePath};
use serde::Serialize;

use crate::index::{Index, ServerIndex};
use crate::{Error, Result, same_content};

/// What a run is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Plan creates and updates without executing anything.
    Draft,
    /// Create and update; never remove.
    Create,
    /// Create and update; never remove.
    Update,
    /// Also drop rows of pages removed locally, leaving their topics alive.
    DeleteTopics,
    /// Also drop rows of pages removed locally and delete their topics.
    Delete,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::Draft,
        Mode::Create,
        Mode::Update,
        Mode::DeleteTopics,
        Mode::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Draft => "draft",
            Mode::Create => "create",
            Mode::Update => "update",
            Mode::DeleteTopics => "delete-topics",
            Mode::Delete => "delete",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Mode::Draft)
    }

    fn removal(&self) -> Option<Removal> {
        match self {
            Mode::Draft | Mode::Create | Mode::Update => None,
            Mode::DeleteTopics => Some(Removal::RowOnly),
            Mode::Delete => Some(Removal::RowAndTopic),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::InvalidMode {
                mode: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    RowOnly,
    RowAndTopic,
}

/// One step of a reconciliation plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationAction {
    /// Create the topic (pages only) and add or convert the row.
    Create { page: Page },
    /// Update the topic when linked and changed, then the row. An absent link
    /// is a row-only change.
    Update { page: Page, link: Option<String> },
    /// Delete the topic and remove the row.
    DeleteTopic { path: PagePath, link: String },
    /// Remove the row, leaving any topic in place.
    RemoveRow { path: PagePath, link: Option<String> },
}

impl ReconciliationAction {
    pub fn path(&self) -> &PagePath {
        match self {
            Self::Create { page } | Self::Update { page, .. } => &page.path,
            Self::DeleteTopic { path, .. } | Self::RemoveRow { path, .. } => path,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            Self::Create { .. } => None,
            Self::Update { link, .. } | Self::RemoveRow { link, .. } => link.as_deref(),
            Self::DeleteTopic { link, .. } => Some(link),
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Self::DeleteTopic { .. } | Self::RemoveRow { .. })
    }
}

/// Compute the actions bringing the server in line with the local tree.
pub fn plan(index: &Index, mode: Mode) -> Vec<ReconciliationAction> {
    let Some(server) = &index.server else {
        return index
            .local
            .pages
            .iter()
            .map(|page| ReconciliationAction::Create { page: page.clone() })
            .collect();
    };

    let table = &server.page.table;
    let mut actions: Vec<ReconciliationAction> = index
        .local
        .pages
        .iter()
        .filter_map(|page| match table.get(&page.path) {
            None => Some(ReconciliationAction::Create { page: page.clone() }),
            Some(row) => compare(page, row, server),
        })
        .collect();

    if let Some(removal) = mode.removal() {
        let local: HashSet<&PagePath> = index.local.pages.iter().map(|p| &p.path).collect();
        for row in table.iter().rev().filter(|row| !local.contains(&row.path)) {
            let action = match (&row.link, removal) {
                (Some(link), Removal::RowAndTopic) => ReconciliationAction::DeleteTopic {
                    path: row.path.clone(),
                    link: link.clone(),
                },
                (link, _) => ReconciliationAction::RemoveRow {
                    path: row.path.clone(),
                    link: link.clone(),
                },
            };
            actions.push(action);
        }
    }

    tracing::debug!(mode = %mode, actions = actions.len(), "Planned reconciliation");
    actions
}

fn compare(page: &Page, row: &NavigationRow, server: &ServerIndex) -> Option<ReconciliationAction> {
    let update = |link: Option<&String>| ReconciliationAction::Update {
        page: page.clone(),
        link: link.cloned(),
    };

    match (page.is_group, &row.link) {
        // A page taking over a group row gets its topic created.
        (false, None) => Some(ReconciliationAction::Create { page: page.clone() }),
        (true, None) => (row.title != page.title).then(|| update(None)),
        (true, Some(link)) => Some(update(Some(link))),
        (false, Some(link)) => {
            let live = server.topic(&page.path).unwrap_or_default();
            (row.title != page.title || !same_content(&page.content, live))
                .then(|| update(Some(link)))
        }
    }
}
