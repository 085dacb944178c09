//! Action executor
//!
//! Applies a plan through the session's clients, then publishes the index
//! page, commits and advances the base-content tag. A failing action is
//! recorded and does not abort independent actions; actions under a failed
//! path are skipped.
//!
//! Topics created by a run are only reachable through the index page. When
//! the index cannot be published they are deleted again, so a rerun creates
//! each page once.

use std::collections::BTreeMap;
use std::path::Path;

use docsync_fs::ConfigStore;
use docsync_git::Tag;
use docsync_nav::{IndexPage, NavigationTable, Page, PagePath};

use crate::index::{Index, index_checksum};
use crate::plan::ReconciliationAction;
use crate::report::Outcome;
use crate::session::Session;
use crate::{Result, same_content};

/// Commit message for reconciliation commits on the base branch.
pub const COMMIT_MESSAGE: &str = "Reconcile documentation with the content server";

/// Result of executing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub outcomes: BTreeMap<PagePath, Outcome>,
    pub index_url: String,
    pub index_changed: bool,
    pub commit: Option<String>,
    /// The tag, when it was moved by this run.
    pub tag: Option<Tag>,
}

impl ExecutionReport {
    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.values().any(Outcome::is_failure)
    }
}

/// Execute `actions` against the server and publish the index page.
///
/// `intro` is the intro content rendered above the navigation table. The tag
/// only advances when every action succeeded and `conflicted` is false.
pub fn execute(
    session: &mut Session<'_>,
    index: &Index,
    actions: &[ReconciliationAction],
    intro: &str,
    conflicted: bool,
) -> Result<ExecutionReport> {
    let mut table = index
        .server
        .as_ref()
        .map(|server| server.page.table.clone())
        .unwrap_or_default();
    let mut outcomes = BTreeMap::new();
    let mut unreconciled: Vec<PagePath> = Vec::new();
    let mut created: Vec<String> = Vec::new();

    for action in actions {
        let path = action.path();

        if let Some(reason) = blocked(action, &unreconciled) {
            tracing::warn!(path = %path, reason = %reason, "Skipping action");
            unreconciled.push(path.clone());
            outcomes.insert(path.clone(), Outcome::Skipped { reason });
            continue;
        }

        let outcome = match apply(session, index, &mut table, &mut created, action) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::error!(path = %path, error = %error, "Action failed");
                unreconciled.push(path.clone());
                Outcome::Failed {
                    error: error.to_string(),
                }
            }
        };
        outcomes.insert(path.clone(), outcome);
    }

    let body = IndexPage::new(intro, table).render();
    let (index_url, index_changed) = match publish_index(session, index, &body) {
        Ok(published) => published,
        Err(error) => {
            tracing::error!(error = %error, created = created.len(), "Index page not published");
            discard_topics(session, &created);
            return Err(error);
        }
    };

    let docs_dir = session.layout.docs_dir().to_path_buf();
    let config_file = session.layout.config_file().to_path_buf();
    let commit = session
        .repository
        .commit(COMMIT_MESSAGE, &[docs_dir.as_path(), config_file.as_path()])?;
    let base_branch = session.options.base_branch.clone();
    session.repository.push(&base_branch, false)?;

    let succeeded = unreconciled.is_empty();
    let tag = if succeeded && !conflicted {
        let head = session.repository.current_commit()?;
        session
            .advance_tag(head, Some(index_checksum(&body)))?
            .then(|| session.tag.clone())
            .flatten()
    } else {
        tracing::warn!(
            failed = unreconciled.len(),
            conflicted,
            "Leaving base-content tag in place"
        );
        None
    };

    Ok(ExecutionReport {
        outcomes,
        index_url,
        index_changed,
        commit,
        tag,
    })
}

/// Reason an action cannot run given the paths that were not reconciled.
fn blocked(action: &ReconciliationAction, unreconciled: &[PagePath]) -> Option<String> {
    let path = action.path();
    if let Some(ancestor) = unreconciled.iter().find(|p| p.is_ancestor_of(path)) {
        return Some(format!("parent '{ancestor}' was not reconciled"));
    }
    // Removing a row drops its subtree, which would lose a child still listed.
    if action.is_removal()
        && let Some(child) = unreconciled.iter().find(|p| path.is_ancestor_of(p))
    {
        return Some(format!("child '{child}' was not removed"));
    }
    None
}

fn apply(
    session: &mut Session<'_>,
    index: &Index,
    table: &mut NavigationTable,
    created: &mut Vec<String>,
    action: &ReconciliationAction,
) -> Result<Outcome> {
    match action {
        ReconciliationAction::Create { page } => create(session, table, created, page),
        ReconciliationAction::Update { page, link } => {
            update(session, index, table, page, link.as_deref())
        }
        ReconciliationAction::RemoveRow { path, link } => {
            table.remove(path);
            tracing::info!(path = %path, "Removed navigation row");
            Ok(Outcome::RowRemoved { url: link.clone() })
        }
        ReconciliationAction::DeleteTopic { path, link } => {
            match session.server.delete_topic(link) {
                Ok(()) => {}
                Err(error) if error.is_not_found() => {
                    tracing::debug!(url = %link, "Topic already deleted");
                }
                Err(error) => return Err(error.into()),
            }
            table.remove(path);
            Ok(Outcome::Deleted { url: link.clone() })
        }
    }
}

fn create(
    session: &mut Session<'_>,
    table: &mut NavigationTable,
    created: &mut Vec<String>,
    page: &Page,
) -> Result<Outcome> {
    let existing = table.get(&page.path).map(|row| row.link.clone());

    let link = match (&existing, page.is_group) {
        (_, true) => None,
        (Some(Some(url)), false) => {
            tracing::info!(path = %page.path, url = %url, "Reusing existing topic");
            Some(url.clone())
        }
        (_, false) => {
            let url = session.server.create_topic(&page.title, &page.content)?;
            created.push(url.clone());
            Some(url)
        }
    };

    if existing.is_some() {
        table.update(&page.path, page.title.clone(), link.clone());
    } else {
        table.insert(page.path.clone(), page.title.clone(), link.clone())?;
    }

    tracing::info!(path = %page.path, "Created page");
    Ok(Outcome::Created { url: link })
}

fn update(
    session: &mut Session<'_>,
    index: &Index,
    table: &mut NavigationTable,
    page: &Page,
    link: Option<&str>,
) -> Result<Outcome> {
    if let (false, Some(url)) = (page.is_group, link) {
        let live = index
            .server
            .as_ref()
            .and_then(|server| server.topic(&page.path))
            .unwrap_or_default();
        if !same_content(&page.content, live) {
            let reason = session.options.edit_reason.clone();
            session.server.update_topic(url, &page.content, &reason)?;
        }
    }

    let row_link = if page.is_group { None } else { link.map(str::to_string) };
    table.update(&page.path, page.title.clone(), row_link);

    tracing::info!(path = %page.path, "Updated page");
    Ok(Outcome::Updated {
        url: link.map(str::to_string),
    })
}

/// Delete topics no published index links to. Failures are logged.
fn discard_topics(session: &mut Session<'_>, urls: &[String]) {
    for url in urls {
        match session.server.delete_topic(url) {
            Ok(()) => tracing::info!(url = %url, "Deleted unpublished topic"),
            Err(error) if error.is_not_found() => {}
            Err(error) => {
                tracing::error!(url = %url, error = %error, "Unpublished topic left orphaned");
            }
        }
    }
}

/// Create or rewrite the index topic. Returns its URL and whether it changed.
fn publish_index(session: &mut Session<'_>, index: &Index, body: &str) -> Result<(String, bool)> {
    if let Some(server) = &index.server {
        if same_content(&server.body, body) {
            tracing::debug!(url = %server.url, "Index page unchanged");
            return Ok((server.url.clone(), false));
        }
        let reason = session.options.edit_reason.clone();
        session.server.update_topic(&server.url, body, &reason)?;
        tracing::info!(url = %server.url, "Updated index page");
        return Ok((server.url.clone(), true));
    }

    let title = session.options.index_title.clone();
    let url = session.server.create_topic(&title, body)?;
    tracing::info!(url = %url, "Created index page");
    if let Err(error) = record_index_url(session, &url) {
        discard_topics(session, std::slice::from_ref(&url));
        return Err(error);
    }
    session.index_url = Some(url.clone());
    Ok((url, true))
}

fn record_index_url(session: &Session<'_>, url: &str) -> Result<()> {
    let config_path = session.layout.config_path();
    if !Path::new(&config_path).exists() {
        tracing::warn!(path = %config_path.display(), "No config file to record the index URL in");
        return Ok(());
    }
    ConfigStore::new().set_value(&config_path, "server", "index_url", url)?;
    Ok(())
}
