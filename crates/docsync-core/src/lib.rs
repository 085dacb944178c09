//! Reconciliation engine for docsync
//!
//! Brings the topics on a content server into agreement with a local
//! documentation tree:
//!
//! 1. [`index::build_index`] pairs the scanned local tree with the live index
//!    page and the content of every linked topic.
//! 2. [`plan::plan`] diffs the two sides into an ordered list of
//!    [`ReconciliationAction`]s.
//! 3. [`coordinator::reconcile`] classifies content updates against the tagged
//!    baseline, routes conflicting edits through a pull request and pulls
//!    remote-only edits into the repository.
//! 4. [`execute::execute`] applies the remaining actions, publishes the index
//!    page, commits and advances the base-content tag.

pub mod cleanup;
pub mod coordinator;
pub mod error;
pub mod execute;
pub mod index;
pub mod plan;
pub mod pull_request;
pub mod report;
pub mod session;

pub use cleanup::cleanup;
pub use coordinator::{check_pull_request, reconcile};
pub use error::{Error, Result};
pub use execute::{ExecutionReport, execute};
pub use index::{Index, ServerIndex, build_index, index_checksum};
pub use plan::{Mode, ReconciliationAction, plan};
pub use pull_request::Conflict;
pub use report::{ActionKind, CoordinatorState, Outcome, RunReport};
pub use session::{Session, SyncOptions};

/// Content equality as the content server sees it: trailing whitespace is
/// not significant.
pub(crate) fn same_content(a: &str, b: &str) -> bool {
    a.trim_end() == b.trim_end()
}
