//! Teardown of everything a reconciliation published

use docsync_git::{PullRequestState, RepositoryClient};
use docsync_server::ContentServer;

use crate::session::SyncOptions;

/// Delete the given topics, the base-content tag, the pull request and the
/// feature branch.
///
/// Every step is attempted even when an earlier one fails. Returns true when
/// all of them succeeded.
pub fn cleanup(
    repository: &mut dyn RepositoryClient,
    server: &mut dyn ContentServer,
    options: &SyncOptions,
    urls: &[String],
) -> bool {
    let mut succeeded = true;

    for url in urls {
        match server.delete_topic(url) {
            Ok(()) => tracing::info!(url = %url, "Deleted topic"),
            Err(error) if error.is_not_found() => {
                tracing::debug!(url = %url, "Topic already deleted");
            }
            Err(error) => {
                tracing::error!(url = %url, error = %error, "Could not delete topic");
                succeeded = false;
            }
        }
    }

    if let Err(error) = repository.delete_tag(&options.tag_name) {
        tracing::error!(tag = %options.tag_name, error = %error, "Could not delete tag");
        succeeded = false;
    }

    match repository.get_pull_request(&options.feature_branch) {
        Ok(Some(pr)) if pr.is_open() => {
            if let Err(error) = repository.edit_pull_request(pr.number, PullRequestState::Closed) {
                tracing::error!(number = pr.number, error = %error, "Could not close pull request");
                succeeded = false;
            }
        }
        Ok(_) => {}
        Err(error) => {
            tracing::error!(error = %error, "Could not look up pull request");
            succeeded = false;
        }
    }

    if let Err(error) = repository.delete_branch(&options.feature_branch) {
        tracing::error!(branch = %options.feature_branch, error = %error, "Could not delete branch");
        succeeded = false;
    }

    succeeded
}
