//! Capability traits consumed by the reconciliation engine

use std::path::Path;

use crate::{PullRequest, PullRequestState, Result, Tag};

/// Version-control operations needed to reconcile a documentation tree.
///
/// Branch and tag mutations are mirrored to the remote: `tag` and
/// `delete_tag` publish immediately, `delete_branch` removes both the local
/// and the remote branch.
pub trait RepositoryClient {
    /// Working directory of the repository.
    fn root(&self) -> &Path;

    /// Update remote-tracking branches and tags.
    fn fetch(&mut self) -> Result<()>;

    fn current_branch(&self) -> Result<String>;

    /// Id of the commit at HEAD.
    fn current_commit(&self) -> Result<String>;

    /// Local and remote branch names, without remote prefixes.
    fn list_branches(&self) -> Result<Vec<String>>;

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_branches()?.iter().any(|b| b == name))
    }

    /// Create or reset `name` to point at the tip of `base`.
    fn create_branch(&mut self, name: &str, base: &str) -> Result<()>;

    /// Check out `branch`, discarding uncommitted changes to tracked files.
    fn switch(&mut self, branch: &str) -> Result<()>;

    /// Stage `paths` (files or directories, relative to the root) and commit.
    ///
    /// Returns `None` when the staged tree equals HEAD's.
    fn commit(&mut self, message: &str, paths: &[&Path]) -> Result<Option<String>>;

    fn push(&mut self, branch: &str, force: bool) -> Result<()>;

    /// Fast-forward `branch` to its remote counterpart.
    fn pull(&mut self, branch: &str) -> Result<()>;

    /// Delete the branch locally and on the remote. Missing branches are ignored.
    fn delete_branch(&mut self, name: &str) -> Result<()>;

    /// Create or move a tag and publish it.
    fn tag(&mut self, tag: &Tag) -> Result<()>;

    fn get_tag(&self, name: &str) -> Result<Option<Tag>>;

    /// Commit the tag points at, if it exists.
    fn tag_exists(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get_tag(name)?.map(|tag| tag.commit))
    }

    /// Delete a tag locally and on the remote. Missing tags are ignored.
    fn delete_tag(&mut self, name: &str) -> Result<()>;

    /// Content of `path` at `commit`, or `None` when the file did not exist.
    fn file_at(&self, commit: &str, path: &Path) -> Result<Option<String>>;

    /// Most relevant pull request from `head`: the open one, else the latest.
    fn get_pull_request(&self, head: &str) -> Result<Option<PullRequest>>;

    fn open_pull_request(&mut self, head: &str, base: &str, title: &str, body: &str)
    -> Result<PullRequest>;

    fn edit_pull_request(&mut self, number: u64, state: PullRequestState) -> Result<()>;
}

/// Hosting service holding pull requests.
pub trait PullRequestHost {
    /// Pull requests whose head is `head`, newest first.
    fn list(&self, head: &str) -> Result<Vec<PullRequest>>;

    fn open(&self, head: &str, base: &str, title: &str, body: &str) -> Result<PullRequest>;

    fn set_state(&self, number: u64, state: PullRequestState) -> Result<()>;
}
