//! In-memory repository client over a real working directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use docsync_git::{Error, PullRequest, PullRequestState, RepositoryClient, Result, Tag};
use walkdir::WalkDir;

const INITIAL_BRANCH: &str = "main";

#[derive(Debug, Clone)]
struct Snapshot {
    parent: Option<String>,
    message: String,
    files: BTreeMap<PathBuf, String>,
}

/// [`RepositoryClient`] whose history lives in memory.
///
/// Commits snapshot files from the working directory on disk; switching
/// branches rewrites the working directory. The "remote" is a second branch
/// map that pushes copy into, so tests can observe what was published.
#[derive(Debug)]
pub struct MemoryRepository {
    root: PathBuf,
    commits: BTreeMap<String, Snapshot>,
    next_commit: usize,
    branches: BTreeMap<String, String>,
    remote_branches: BTreeMap<String, String>,
    head: String,
    tags: BTreeMap<String, Tag>,
    pull_requests: Vec<PullRequest>,
    failing_pushes: BTreeSet<String>,
}

impl MemoryRepository {
    /// Repository on `main` whose first commit holds every file under `root`,
    /// already pushed.
    ///
    /// # Panics
    /// Panics when the working directory cannot be read.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut repo = Self {
            root,
            commits: BTreeMap::new(),
            next_commit: 0,
            branches: BTreeMap::new(),
            remote_branches: BTreeMap::new(),
            head: INITIAL_BRANCH.to_string(),
            tags: BTreeMap::new(),
            pull_requests: Vec::new(),
            failing_pushes: BTreeSet::new(),
        };

        let files = repo
            .read_tree(Path::new(""))
            .unwrap_or_else(|e| panic!("MemoryRepository: failed to read working tree: {e}"));
        let id = repo.store(None, "Initial commit", files);
        repo.branches.insert(INITIAL_BRANCH.to_string(), id.clone());
        repo.remote_branches.insert(INITIAL_BRANCH.to_string(), id);
        repo
    }

    /// Commit on the remote side of `branch`.
    pub fn remote_commit(&self, branch: &str) -> Option<&str> {
        self.remote_branches.get(branch).map(String::as_str)
    }

    pub fn commit_message(&self, id: &str) -> Option<&str> {
        self.commits.get(id).map(|c| c.message.as_str())
    }

    /// Content of a file at the tip of the remote `branch`.
    pub fn remote_file(&self, branch: &str, path: impl AsRef<Path>) -> Option<&str> {
        let id = self.remote_branches.get(branch)?;
        self.commits
            .get(id)?
            .files
            .get(path.as_ref())
            .map(String::as_str)
    }

    pub fn pull_requests(&self) -> &[PullRequest] {
        &self.pull_requests
    }

    /// Make every push of `branch` fail.
    pub fn fail_push(&mut self, branch: &str) {
        self.failing_pushes.insert(branch.to_string());
    }

    /// Merge an open pull request on the remote.
    ///
    /// Files changed on the head branch since it forked from the base are
    /// applied on top of the remote base.
    ///
    /// # Panics
    /// Panics when the pull request or its branches do not exist.
    pub fn merge_pull_request(&mut self, number: u64) -> String {
        let pr = self
            .pull_requests
            .iter()
            .find(|pr| pr.number == number)
            .cloned()
            .unwrap_or_else(|| panic!("MemoryRepository: no pull request #{number}"));
        let head = self.remote_branches[&pr.head].clone();
        let base = self.remote_branches[&pr.base].clone();

        let fork = self
            .ancestors(&head)
            .into_iter()
            .find(|id| self.is_ancestor(id, &base))
            .unwrap_or_else(|| panic!("MemoryRepository: #{number} shares no history with base"));

        let fork_files = &self.commits[&fork].files;
        let head_files = &self.commits[&head].files;
        let mut files = self.commits[&base].files.clone();
        let changed: BTreeSet<&PathBuf> = fork_files.keys().chain(head_files.keys()).collect();
        for path in changed {
            if fork_files.get(path) == head_files.get(path) {
                continue;
            }
            match head_files.get(path) {
                Some(content) => files.insert(path.clone(), content.clone()),
                None => files.remove(path),
            };
        }

        let merged = self.store(Some(base), &format!("Merge pull request #{number}"), files);
        self.remote_branches.insert(pr.base.clone(), merged.clone());
        self.set_pull_request(number, PullRequestState::Closed, true);
        merged
    }

    /// Close a pull request without merging it.
    pub fn close_pull_request(&mut self, number: u64) {
        self.set_pull_request(number, PullRequestState::Closed, false);
    }

    fn set_pull_request(&mut self, number: u64, state: PullRequestState, merged: bool) {
        if let Some(pr) = self.pull_requests.iter_mut().find(|pr| pr.number == number) {
            pr.state = state;
            pr.merged = merged;
        }
    }

    fn store(&mut self, parent: Option<String>, message: &str, files: BTreeMap<PathBuf, String>) -> String {
        let id = format!("{:040x}", self.next_commit);
        self.next_commit += 1;
        self.commits.insert(
            id.clone(),
            Snapshot {
                parent,
                message: message.to_string(),
                files,
            },
        );
        id
    }

    fn head_commit(&self) -> Result<&String> {
        self.branches.get(&self.head).ok_or_else(|| Error::BranchNotFound {
            name: self.head.clone(),
        })
    }

    fn ancestors(&self, id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(id.to_string());
        while let Some(id) = current {
            current = self.commits.get(&id).and_then(|c| c.parent.clone());
            chain.push(id);
        }
        chain
    }

    /// True when `ancestor` is `id` or one of its ancestors.
    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        self.ancestors(id).iter().any(|a| a == ancestor)
    }

    fn read_tree(&self, relative: &Path) -> std::io::Result<BTreeMap<PathBuf, String>> {
        let mut files = BTreeMap::new();
        let start = self.root.join(relative);
        if !start.exists() {
            return Ok(files);
        }
        for entry in WalkDir::new(&start).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(std::io::Error::other)?
                .to_path_buf();
            files.insert(path, fs::read_to_string(entry.path())?);
        }
        Ok(files)
    }

    /// Replace tracked files of `from` with those of `to` on disk.
    fn checkout(&self, from: &str, to: &str) -> Result<()> {
        let io = |e: std::io::Error| Error::PullFailed {
            message: e.to_string(),
        };
        let from = &self.commits[from].files;
        let to = &self.commits[to].files;
        for path in from.keys().filter(|p| !to.contains_key(*p)) {
            let absolute = self.root.join(path);
            if absolute.exists() {
                fs::remove_file(absolute).map_err(io)?;
            }
        }
        for (path, content) in to {
            let absolute = self.root.join(path);
            if let Some(parent) = absolute.parent() {
                fs::create_dir_all(parent).map_err(io)?;
            }
            fs::write(absolute, content).map_err(io)?;
        }
        Ok(())
    }

    fn resolve_branch(&self, name: &str) -> Result<String> {
        self.branches
            .get(name)
            .or_else(|| self.remote_branches.get(name))
            .cloned()
            .ok_or_else(|| Error::BranchNotFound {
                name: name.to_string(),
            })
    }
}

impl RepositoryClient for MemoryRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn fetch(&mut self) -> Result<()> {
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.head.clone())
    }

    fn current_commit(&self) -> Result<String> {
        self.head_commit().cloned()
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        let names: BTreeSet<&String> = self
            .branches
            .keys()
            .chain(self.remote_branches.keys())
            .collect();
        Ok(names.into_iter().cloned().collect())
    }

    fn create_branch(&mut self, name: &str, base: &str) -> Result<()> {
        let commit = self.resolve_branch(base)?;
        self.branches.insert(name.to_string(), commit);
        Ok(())
    }

    fn switch(&mut self, branch: &str) -> Result<()> {
        let target = self.resolve_branch(branch)?;
        let current = self.head_commit()?.clone();
        self.checkout(&current, &target)?;
        self.branches.insert(branch.to_string(), target);
        self.head = branch.to_string();
        Ok(())
    }

    fn commit(&mut self, message: &str, paths: &[&Path]) -> Result<Option<String>> {
        let parent = self.head_commit()?.clone();
        let mut files = self.commits[&parent].files.clone();

        for path in paths {
            files.retain(|p, _| !p.starts_with(path));
            let current = self.read_tree(path).map_err(|e| Error::PullFailed {
                message: e.to_string(),
            })?;
            files.extend(current);
        }

        if files == self.commits[&parent].files {
            return Ok(None);
        }

        let id = self.store(Some(parent), message, files);
        self.branches.insert(self.head.clone(), id.clone());
        Ok(Some(id))
    }

    fn push(&mut self, branch: &str, force: bool) -> Result<()> {
        if self.failing_pushes.contains(branch) {
            return Err(Error::PushFailed {
                message: format!("{branch}: injected failure"),
            });
        }
        let local = self.branches.get(branch).cloned().ok_or_else(|| Error::BranchNotFound {
            name: branch.to_string(),
        })?;
        if let Some(remote) = self.remote_branches.get(branch)
            && !force
            && !self.is_ancestor(remote, &local)
        {
            return Err(Error::PushFailed {
                message: format!("refs/heads/{branch}: non-fast-forward"),
            });
        }
        self.remote_branches.insert(branch.to_string(), local);
        Ok(())
    }

    fn pull(&mut self, branch: &str) -> Result<()> {
        let remote = self
            .remote_branches
            .get(branch)
            .cloned()
            .ok_or_else(|| Error::BranchNotFound {
                name: branch.to_string(),
            })?;
        let Some(local) = self.branches.get(branch).cloned() else {
            self.branches.insert(branch.to_string(), remote);
            return Ok(());
        };

        if self.is_ancestor(&remote, &local) {
            return Ok(());
        }
        if !self.is_ancestor(&local, &remote) {
            return Err(Error::CannotFastForward {
                message: format!("{branch} diverged from its remote"),
            });
        }

        if self.head == branch {
            self.checkout(&local, &remote)?;
        }
        self.branches.insert(branch.to_string(), remote);
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        self.branches.remove(name);
        self.remote_branches.remove(name);
        Ok(())
    }

    fn tag(&mut self, tag: &Tag) -> Result<()> {
        if !self.commits.contains_key(&tag.commit) {
            return Err(Error::InvalidObjectId {
                id: tag.commit.clone(),
            });
        }
        self.tags.insert(tag.name.clone(), tag.clone());
        Ok(())
    }

    fn get_tag(&self, name: &str) -> Result<Option<Tag>> {
        Ok(self.tags.get(name).cloned())
    }

    fn delete_tag(&mut self, name: &str) -> Result<()> {
        self.tags.remove(name);
        Ok(())
    }

    fn file_at(&self, commit: &str, path: &Path) -> Result<Option<String>> {
        let snapshot = self.commits.get(commit).ok_or_else(|| Error::InvalidObjectId {
            id: commit.to_string(),
        })?;
        Ok(snapshot.files.get(path).cloned())
    }

    fn get_pull_request(&self, head: &str) -> Result<Option<PullRequest>> {
        let mut matching = self.pull_requests.iter().rev().filter(|pr| pr.head == head);
        let latest = matching.clone().next().cloned();
        Ok(matching.find(|pr| pr.is_open()).cloned().or(latest))
    }

    fn open_pull_request(
        &mut self,
        head: &str,
        base: &str,
        _title: &str,
        _body: &str,
    ) -> Result<PullRequest> {
        if let Some(existing) = self
            .pull_requests
            .iter()
            .find(|pr| pr.head == head && pr.base == base && pr.is_open())
        {
            return Err(Error::PullRequestExists {
                number: existing.number,
                head: head.to_string(),
                base: base.to_string(),
            });
        }
        if !self.remote_branches.contains_key(head) {
            return Err(Error::BranchNotFound {
                name: head.to_string(),
            });
        }

        let pr = PullRequest {
            number: self.pull_requests.len() as u64 + 1,
            head: head.to_string(),
            base: base.to_string(),
            state: PullRequestState::Open,
            merged: false,
            url: None,
        };
        self.pull_requests.push(pr.clone());
        Ok(pr)
    }

    fn edit_pull_request(&mut self, number: u64, state: PullRequestState) -> Result<()> {
        let pr = self
            .pull_requests
            .iter_mut()
            .find(|pr| pr.number == number)
            .ok_or(Error::PullRequestNotFound { number })?;
        pr.state = state;
        Ok(())
    }
}
