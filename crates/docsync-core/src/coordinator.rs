//! Conflict and pull request coordinator
//!
//! Wraps planning and execution with the baseline bookkeeping: adopts or
//! abandons the previous pull request, classifies content updates three-way
//! against the base-content tag, pulls remote-only edits into the local tree
//! and routes conflicting edits to a pull request on the feature branch.

use std::path::{Path, PathBuf};

use docsync_fs::{DocsBackup, io, scan};
use docsync_git::{PullRequest, RepositoryClient};
use docsync_nav::PagePath;

use crate::execute::execute;
use crate::index::{Index, build_index, index_checksum};
use crate::plan::{Mode, ReconciliationAction, plan};
use crate::pull_request::{Conflict, PULL_REQUEST_TITLE, pull_request_body};
use crate::report::{CoordinatorState, Outcome, RunReport};
use crate::session::{Session, SyncOptions};
use crate::{Error, Result, same_content};

/// Commit message for the server versions of conflicting pages.
const BRANCH_COMMIT_MESSAGE: &str = "Adopt documentation edits from the content server";

/// Run one reconciliation in `mode`.
///
/// [`Mode::Draft`] only plans. Every other mode requires the base branch to
/// be checked out.
pub fn reconcile(session: &mut Session<'_>, mode: Mode) -> Result<RunReport> {
    if mode.is_dry_run() {
        return draft(session);
    }

    let base = session.options.base_branch.clone();
    let current = session.repository.current_branch()?;
    if current != base {
        return Err(Error::WrongBranch {
            expected: base,
            actual: current,
        });
    }

    session.repository.fetch()?;
    session.load_tag()?;
    let previous = resolve_previous(session)?;

    let local = scan(&session.layout)?;
    let index = build_index(local, &*session.server, session.index_url.as_deref())?;
    let actions = plan(&index, mode);

    let mut triage = Triage::default();
    let actions = triage.updates(session, &index, actions, previous.authoritative)?;
    let intro = triage.intro(session, &index, previous.authoritative)?;

    let mut state = previous.state;
    let mut pull_request = previous.pull_request;
    let mut branch_error = None;
    if !triage.conflicts.is_empty() {
        tracing::warn!(conflicts = triage.conflicts.len(), "Local and remote edits conflict");
        let open = pull_request.filter(PullRequest::is_open);
        let proposal = propose(session, &triage.conflicts, open)?;
        state = proposal.state;
        pull_request = proposal.pull_request;
        branch_error = proposal.error;
    }

    for pull in &triage.pulled {
        let path = session.layout.resolve(&pull.source);
        io::write_text(&path, &file_text(&pull.content))?;
        tracing::info!(path = %pull.source.display(), "Pulled remote edit");
    }

    let conflicted = !triage.conflicts.is_empty();
    let executed = execute(session, &index, &actions, &intro, conflicted)?;

    let mut outcomes = executed.outcomes;
    for pull in &triage.pulled {
        let Some(path) = &pull.path else {
            continue;
        };
        if let Some(outcome) = outcomes.get_mut(path)
            && matches!(outcome, Outcome::Updated { .. })
        {
            *outcome = Outcome::Pulled {
                url: pull.url.clone(),
            };
        }
    }
    for conflict in &triage.conflicts {
        let Some(path) = &conflict.path else {
            continue;
        };
        let outcome = match &branch_error {
            Some(error) => Outcome::Failed {
                error: error.clone(),
            },
            None => Outcome::Conflict {
                url: conflict.url.clone(),
                pull_request: pull_request.as_ref().map(|pr| pr.number),
            },
        };
        outcomes.insert(path.clone(), outcome);
    }

    tracing::info!(mode = %mode, state = %state, "Reconciliation finished");
    Ok(RunReport {
        mode,
        state,
        outcomes,
        index_url: Some(executed.index_url),
        index_changed: executed.index_changed,
        index_conflict: triage.conflicts.iter().any(|c| c.path.is_none()),
        commit: executed.commit,
        tag: session.tag.clone(),
        pull_request,
    })
}

/// Whether the pull request for conflicting edits is open against the base
/// branch.
pub fn check_pull_request(repository: &dyn RepositoryClient, options: &SyncOptions) -> Result<bool> {
    let open = repository
        .get_pull_request(&options.feature_branch)?
        .is_some_and(|pr| {
            pr.is_open() && pr.head == options.feature_branch && pr.base == options.base_branch
        });
    Ok(open)
}

fn draft(session: &mut Session<'_>) -> Result<RunReport> {
    session.load_tag()?;
    let local = scan(&session.layout)?;
    let index = build_index(local, &*session.server, session.index_url.as_deref())?;

    let outcomes = plan(&index, Mode::Draft)
        .iter()
        .map(|action| {
            let outcome = Outcome::Planned {
                action: action.into(),
                url: action.link().map(str::to_string),
            };
            (action.path().clone(), outcome)
        })
        .collect();

    Ok(RunReport {
        mode: Mode::Draft,
        state: CoordinatorState::Clean,
        outcomes,
        index_url: session.index_url.clone(),
        index_changed: false,
        index_conflict: false,
        commit: None,
        tag: session.tag.clone(),
        pull_request: None,
    })
}

/// What the previous run's pull request left behind.
struct Previous {
    state: CoordinatorState,
    pull_request: Option<PullRequest>,
    /// The local tree already holds the reviewed server edits.
    authoritative: bool,
}

fn resolve_previous(session: &mut Session<'_>) -> Result<Previous> {
    let feature = session.options.feature_branch.clone();
    let base = session.options.base_branch.clone();

    let clean = Previous {
        state: CoordinatorState::Clean,
        pull_request: None,
        authoritative: false,
    };
    let Some(pr) = session.repository.get_pull_request(&feature)? else {
        return Ok(clean);
    };

    if pr.is_open() {
        tracing::info!(number = pr.number, "Pull request is still open");
        return Ok(Previous {
            state: CoordinatorState::PrPending,
            pull_request: Some(pr),
            authoritative: false,
        });
    }

    if !session.repository.branch_exists(&feature)? {
        return Ok(clean);
    }

    if pr.merged {
        session.repository.pull(&base)?;
        let head = session.repository.current_commit()?;
        let checksum = session.tag.as_ref().and_then(|tag| tag.index_checksum.clone());
        session.advance_tag(head, checksum)?;
        session.repository.delete_branch(&feature)?;
        tracing::info!(number = pr.number, "Adopted merged pull request");
        Ok(Previous {
            state: CoordinatorState::Merged,
            pull_request: Some(pr),
            authoritative: true,
        })
    } else {
        session.repository.delete_branch(&feature)?;
        tracing::info!(number = pr.number, "Pull request closed without merge; branch deleted");
        Ok(Previous {
            state: CoordinatorState::Abandoned,
            pull_request: Some(pr),
            authoritative: false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    /// Only the local side changed.
    Apply,
    /// Only the remote side changed.
    Pull,
    Conflict,
}

fn classify(authoritative: bool, baseline: Option<&str>, local: &str, remote: &str) -> Classification {
    if authoritative {
        return Classification::Apply;
    }
    match baseline {
        Some(baseline) if same_content(baseline, remote) => Classification::Apply,
        Some(baseline) if same_content(baseline, local) => Classification::Pull,
        _ => Classification::Conflict,
    }
}

/// A remote edit to write into the local tree.
#[derive(Debug)]
struct Pull {
    /// `None` for the index page intro.
    path: Option<PagePath>,
    url: String,
    source: PathBuf,
    content: String,
}

#[derive(Debug, Default)]
struct Triage {
    pulled: Vec<Pull>,
    conflicts: Vec<Conflict>,
}

impl Triage {
    /// Classify content updates, returning the actions left for the executor.
    ///
    /// Pulled updates keep their row change with the remote content, so the
    /// executor leaves the topic alone. Conflicting updates are dropped.
    fn updates(
        &mut self,
        session: &Session<'_>,
        index: &Index,
        actions: Vec<ReconciliationAction>,
        authoritative: bool,
    ) -> Result<Vec<ReconciliationAction>> {
        let Some(server) = &index.server else {
            return Ok(actions);
        };

        let mut kept = Vec::with_capacity(actions.len());
        for action in actions {
            let (mut page, url) = match action {
                ReconciliationAction::Update {
                    page,
                    link: Some(url),
                } => (page, url),
                other => {
                    kept.push(other);
                    continue;
                }
            };

            let remote = server.topic(&page.path).unwrap_or_default();
            let changed = !page.is_group && !same_content(&page.content, remote);
            let source = page.source.clone().filter(|_| changed);
            let Some(source) = source else {
                kept.push(ReconciliationAction::Update {
                    page,
                    link: Some(url),
                });
                continue;
            };

            let baseline = baseline(session, &source)?;
            match classify(authoritative, baseline.as_deref(), &page.content, remote) {
                Classification::Apply => {}
                Classification::Pull => {
                    tracing::debug!(path = %page.path, "Remote-only edit");
                    self.pulled.push(Pull {
                        path: Some(page.path.clone()),
                        url: url.clone(),
                        source,
                        content: remote.to_string(),
                    });
                    page.content = remote.to_string();
                }
                Classification::Conflict => {
                    tracing::debug!(path = %page.path, "Conflicting edit");
                    self.conflicts.push(Conflict {
                        path: Some(page.path.clone()),
                        url,
                        source,
                        local: page.content,
                        remote: remote.to_string(),
                    });
                    continue;
                }
            }
            kept.push(ReconciliationAction::Update {
                page,
                link: Some(url),
            });
        }
        Ok(kept)
    }

    /// Classify the index intro, returning the intro to publish.
    ///
    /// Only runs when the live index body moved away from the tagged checksum.
    fn intro(&mut self, session: &Session<'_>, index: &Index, authoritative: bool) -> Result<String> {
        let local = index.local.index_content.clone();
        let Some(server) = &index.server else {
            return Ok(local);
        };
        let remote = &server.page.content;
        if same_content(&local, remote) {
            return Ok(local);
        }

        let live = index_checksum(&server.body);
        let tagged = session.tag.as_ref().and_then(|tag| tag.index_checksum.as_deref());
        if tagged == Some(live.as_str()) {
            return Ok(local);
        }

        let source = session.layout.index_file();
        let baseline = match &session.tag {
            Some(_) => Some(baseline(session, &source)?.unwrap_or_default()),
            None => None,
        };

        match classify(authoritative, baseline.as_deref(), &local, remote) {
            Classification::Apply => Ok(local),
            Classification::Pull => {
                tracing::debug!("Remote-only edit of the index intro");
                self.pulled.push(Pull {
                    path: None,
                    url: server.url.clone(),
                    source,
                    content: remote.clone(),
                });
                Ok(remote.clone())
            }
            Classification::Conflict => {
                tracing::debug!("Conflicting edit of the index intro");
                self.conflicts.push(Conflict {
                    path: None,
                    url: server.url.clone(),
                    source,
                    local,
                    remote: remote.clone(),
                });
                Ok(remote.clone())
            }
        }
    }
}

/// Content of `source` at the tagged commit.
fn baseline(session: &Session<'_>, source: &Path) -> Result<Option<String>> {
    match &session.tag {
        Some(tag) => Ok(session.repository.file_at(&tag.commit, source)?),
        None => Ok(None),
    }
}

/// Where the pull request workflow ended up this run.
struct Proposal {
    state: CoordinatorState,
    pull_request: Option<PullRequest>,
    error: Option<String>,
}

/// Publish the server versions of `conflicts` on the feature branch and open
/// or reuse the pull request.
///
/// Feature-branch failures are reported in the proposal. Failing to get back
/// to the base branch with the local tree intact is fatal.
fn propose(
    session: &mut Session<'_>,
    conflicts: &[Conflict],
    open: Option<PullRequest>,
) -> Result<Proposal> {
    let feature = session.options.feature_branch.clone();
    let base = session.options.base_branch.clone();

    let backup = DocsBackup::capture(&session.layout)?;
    let published = publish_branch(session, conflicts);
    session.repository.switch(&base)?;
    backup.restore(&session.layout)?;

    if let Err(error) = published {
        tracing::error!(branch = %feature, error = %error, "Could not publish feature branch");
        return Ok(Proposal {
            state: CoordinatorState::Diverged,
            pull_request: None,
            error: Some(error.to_string()),
        });
    }

    let existing = open.filter(|pr| pr.base == base);
    let pull_request = match existing {
        Some(pr) => {
            tracing::info!(number = pr.number, "Updated open pull request");
            Ok(pr)
        }
        None => {
            let body = pull_request_body(conflicts);
            session
                .repository
                .open_pull_request(&feature, &base, PULL_REQUEST_TITLE, &body)
        }
    };

    match pull_request {
        Ok(pr) => {
            tracing::info!(number = pr.number, url = ?pr.url, "Pull request pending");
            Ok(Proposal {
                state: CoordinatorState::PrPending,
                pull_request: Some(pr),
                error: None,
            })
        }
        Err(error) => {
            tracing::error!(branch = %feature, error = %error, "Could not open pull request");
            Ok(Proposal {
                state: CoordinatorState::Branched,
                pull_request: None,
                error: Some(error.to_string()),
            })
        }
    }
}

fn publish_branch(session: &mut Session<'_>, conflicts: &[Conflict]) -> Result<()> {
    let feature = session.options.feature_branch.clone();
    let base = session.options.base_branch.clone();

    session.repository.create_branch(&feature, &base)?;
    session.repository.switch(&feature)?;
    for conflict in conflicts {
        let path = session.layout.resolve(&conflict.source);
        io::write_text(&path, &file_text(&conflict.remote))?;
    }

    let sources: Vec<&Path> = conflicts.iter().map(|c| c.source.as_path()).collect();
    session.repository.commit(BRANCH_COMMIT_MESSAGE, &sources)?;
    session.repository.push(&feature, true)?;
    tracing::info!(branch = %feature, conflicts = conflicts.len(), "Published feature branch");
    Ok(())
}

/// File text for page content: trailing whitespace folded to one newline.
fn file_text(content: &str) -> String {
    format!("{}\n", content.trim_end())
}
