//! Shared git2 helper functions
//!
//! These functions encapsulate the remote and reference patterns used by
//! [`GitRepository`](crate::GitRepository).

use std::cell::RefCell;

use git2::{
    BranchType, Cred, FetchOptions, FetchPrune, Oid, PushOptions, RemoteCallbacks, Repository,
};

use crate::{Error, Result};

/// Get the current branch name from a repository.
///
/// Returns the branch name if HEAD points to a branch, or `None` if HEAD is detached.
pub fn get_current_branch(repo: &Repository) -> Result<Option<String>> {
    let head = repo.head()?;

    if head.is_branch() {
        Ok(Some(head.shorthand().unwrap_or("HEAD").to_string()))
    } else {
        Ok(None)
    }
}

/// Remote callbacks authenticating with a token when one is given.
///
/// Without a token, transports fall back to credential-free access, which is
/// what local and file remotes need.
pub fn remote_callbacks(token: Option<&str>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(token) = token {
        callbacks.credentials(move |_url, _username, _allowed| {
            Cred::userpass_plaintext("x-access-token", token)
        });
    }
    callbacks
}

/// Fetch `refspecs` from a remote, pruning refs that vanished upstream.
pub fn fetch(
    repo: &Repository,
    remote_name: &str,
    refspecs: &[String],
    token: Option<&str>,
) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| Error::RemoteNotFound {
            name: remote_name.to_string(),
        })?;

    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks(token));
    options.prune(FetchPrune::On);

    remote
        .fetch(refspecs, Some(&mut options), None)
        .map_err(|e| Error::PullFailed {
            message: format!("Fetch failed: {}", e.message()),
        })
}

/// Push `refspecs` to a remote.
///
/// A reference the remote refuses to update fails the push even when the
/// transport itself succeeded.
pub fn push(
    repo: &Repository,
    remote_name: &str,
    refspecs: &[String],
    token: Option<&str>,
) -> Result<()> {
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| Error::RemoteNotFound {
            name: remote_name.to_string(),
        })?;

    let rejected = RefCell::new(None::<String>);
    {
        let mut callbacks = remote_callbacks(token);
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                *rejected.borrow_mut() = Some(format!("{refname}: {status}"));
            }
            Ok(())
        });
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        remote
            .push(refspecs, Some(&mut options))
            .map_err(|e| Error::PushFailed {
                message: e.message().to_string(),
            })?;
    }

    match rejected.into_inner() {
        Some(message) => Err(Error::PushFailed { message }),
        None => Ok(()),
    }
}

/// Move `branch` forward to `target`.
///
/// Creates the branch when missing, does nothing when it already contains
/// `target`, and refuses to move it when the histories diverged. The working
/// tree is refreshed when `branch` is checked out.
pub fn fast_forward(repo: &Repository, branch: &str, target: Oid) -> Result<()> {
    let refname = format!("refs/heads/{}", branch);

    let mut reference = match repo.find_reference(&refname) {
        Ok(reference) => reference,
        Err(_) => {
            repo.reference(&refname, target, false, "pull: create branch")?;
            return Ok(());
        }
    };

    let current = reference.peel_to_commit()?.id();
    if current == target || repo.graph_descendant_of(current, target)? {
        return Ok(());
    }

    if !repo.graph_descendant_of(target, current)? {
        return Err(Error::CannotFastForward {
            message: format!(
                "Cannot fast-forward {} from {} to {}. Manual merge required.",
                branch, current, target
            ),
        });
    }

    reference.set_target(target, &format!("pull: fast-forward to {}", target))?;

    if get_current_branch(repo)?.as_deref() == Some(branch) {
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
    }

    tracing::debug!(branch = %branch, from = %current, to = %target, "Fast-forwarded branch");
    Ok(())
}

/// Commit at the tip of a local branch, falling back to the remote-tracking one.
pub fn branch_commit<'r>(
    repo: &'r Repository,
    remote_name: &str,
    branch: &str,
) -> Result<git2::Commit<'r>> {
    if let Ok(local) = repo.find_branch(branch, BranchType::Local) {
        return Ok(local.get().peel_to_commit()?);
    }

    let tracking = format!("{}/{}", remote_name, branch);
    let remote = repo
        .find_branch(&tracking, BranchType::Remote)
        .map_err(|_| Error::BranchNotFound {
            name: branch.to_string(),
        })?;
    Ok(remote.get().peel_to_commit()?)
}

/// Parse a hex commit id.
pub fn parse_oid(id: &str) -> Result<Oid> {
    Oid::from_str(id).map_err(|_| Error::InvalidObjectId { id: id.to_string() })
}
