//! `git2`-backed repository client

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, IndexAddOption, ObjectType, Repository, Signature};

use crate::helpers;
use crate::{Error, PullRequest, PullRequestHost, PullRequestState, RepositoryClient, Result, Tag};

const FALLBACK_AUTHOR: &str = "docsync";
const FALLBACK_EMAIL: &str = "docsync@localhost";

/// Repository client operating on a local clone and one remote.
pub struct GitRepository {
    repo: Repository,
    root: PathBuf,
    remote: String,
    token: Option<String>,
    host: Option<Box<dyn PullRequestHost>>,
}

impl std::fmt::Debug for GitRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepository")
            .field("root", &self.root)
            .field("remote", &self.remote)
            .field("host", &self.host.is_some())
            .finish()
    }
}

impl GitRepository {
    /// Open the repository whose working directory is `path`.
    pub fn open(path: impl AsRef<Path>, remote: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)?;
        let root = repo
            .workdir()
            .ok_or_else(|| Error::BareRepository {
                path: path.to_path_buf(),
            })?
            .to_path_buf();

        Ok(Self {
            repo,
            root,
            remote: remote.into(),
            token: None,
            host: None,
        })
    }

    /// Authenticate remote operations with a token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Delegate pull-request operations to `host`.
    pub fn with_host(mut self, host: impl PullRequestHost + 'static) -> Self {
        self.host = Some(Box::new(host));
        self
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature.to_owned()),
            Err(_) => Ok(Signature::now(FALLBACK_AUTHOR, FALLBACK_EMAIL)?),
        }
    }

    fn host(&self) -> Result<&dyn PullRequestHost> {
        self.host.as_deref().ok_or(Error::NoPullRequestHost)
    }

    fn push_refspecs(&self, refspecs: &[String]) -> Result<()> {
        helpers::push(&self.repo, &self.remote, refspecs, self.token.as_deref())
    }

    fn tracking_ref(&self, branch: &str) -> String {
        format!("refs/remotes/{}/{}", self.remote, branch)
    }
}

impl RepositoryClient for GitRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn fetch(&mut self) -> Result<()> {
        let refspecs = [
            format!("+refs/heads/*:refs/remotes/{}/*", self.remote),
            "+refs/tags/*:refs/tags/*".to_string(),
        ];
        helpers::fetch(&self.repo, &self.remote, &refspecs, self.token.as_deref())?;
        tracing::debug!(remote = %self.remote, "Fetched branches and tags");
        Ok(())
    }

    fn current_branch(&self) -> Result<String> {
        helpers::get_current_branch(&self.repo)?.ok_or(Error::DetachedHead)
    }

    fn current_commit(&self) -> Result<String> {
        Ok(self.repo.head()?.peel_to_commit()?.id().to_string())
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        let remote_prefix = format!("{}/", self.remote);
        let mut names = BTreeSet::new();

        for branch in self.repo.branches(None)? {
            let (branch, kind) = branch?;
            let Some(name) = branch.name()? else {
                continue;
            };
            match kind {
                BranchType::Local => {
                    names.insert(name.to_string());
                }
                BranchType::Remote => {
                    if let Some(stripped) = name.strip_prefix(&remote_prefix)
                        && stripped != "HEAD"
                    {
                        names.insert(stripped.to_string());
                    }
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    fn create_branch(&mut self, name: &str, base: &str) -> Result<()> {
        let commit = helpers::branch_commit(&self.repo, &self.remote, base)?;
        self.repo.branch(name, &commit, true)?;
        tracing::debug!(branch = %name, base = %base, commit = %commit.id(), "Created branch");
        Ok(())
    }

    fn switch(&mut self, branch: &str) -> Result<()> {
        if self.repo.find_branch(branch, BranchType::Local).is_err() {
            let commit = helpers::branch_commit(&self.repo, &self.remote, branch)?;
            let upstream = format!("{}/{}", self.remote, branch);
            let mut local = self.repo.branch(branch, &commit, false)?;
            local.set_upstream(Some(upstream.as_str()))?;
        }

        // Safe checkout: uncommitted edits to files both branches share are
        // carried over, edits the switch would overwrite abort it.
        let refname = format!("refs/heads/{}", branch);
        let tree = self.repo.find_reference(&refname)?.peel_to_tree()?;
        self.repo
            .checkout_tree(
                tree.as_object(),
                Some(git2::build::CheckoutBuilder::new().safe()),
            )
            .map_err(|e| match e.code() {
                ErrorCode::Conflict => Error::UncommittedChanges {
                    branch: branch.to_string(),
                    message: e.message().to_string(),
                },
                _ => Error::Git(e),
            })?;
        self.repo.set_head(&refname)?;

        tracing::debug!(branch = %branch, "Switched branch");
        Ok(())
    }

    fn commit(&mut self, message: &str, paths: &[&Path]) -> Result<Option<String>> {
        let specs: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();

        let mut index = self.repo.index()?;
        index.add_all(specs.iter().map(String::as_str), IndexAddOption::DEFAULT, None)?;
        index.update_all(specs.iter().map(String::as_str), None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };

        if let Some(parent) = &parent
            && parent.tree_id() == tree_id
        {
            tracing::debug!("Nothing to commit");
            return Ok(None);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        tracing::info!(commit = %oid, "Committed documentation changes");
        Ok(Some(oid.to_string()))
    }

    fn push(&mut self, branch: &str, force: bool) -> Result<()> {
        let plus = if force { "+" } else { "" };
        self.push_refspecs(&[format!(
            "{}refs/heads/{}:refs/heads/{}",
            plus, branch, branch
        )])?;
        tracing::debug!(branch = %branch, force, "Pushed branch");
        Ok(())
    }

    fn pull(&mut self, branch: &str) -> Result<()> {
        let tracking = self.tracking_ref(branch);
        helpers::fetch(
            &self.repo,
            &self.remote,
            &[format!("+refs/heads/{}:{}", branch, tracking)],
            self.token.as_deref(),
        )?;

        let target = self
            .repo
            .find_reference(&tracking)
            .map_err(|_| Error::BranchNotFound {
                name: branch.to_string(),
            })?
            .peel_to_commit()?
            .id();

        helpers::fast_forward(&self.repo, branch, target)
    }

    fn delete_branch(&mut self, name: &str) -> Result<()> {
        if let Ok(mut branch) = self.repo.find_branch(name, BranchType::Local) {
            branch.delete()?;
        }

        let tracking = self.tracking_ref(name);
        if self.repo.find_reference(&tracking).is_ok() {
            self.push_refspecs(&[format!(":refs/heads/{}", name)])?;
            if let Ok(mut reference) = self.repo.find_reference(&tracking) {
                reference.delete()?;
            }
        }

        tracing::debug!(branch = %name, "Deleted branch");
        Ok(())
    }

    fn tag(&mut self, tag: &Tag) -> Result<()> {
        let oid = helpers::parse_oid(&tag.commit)?;
        let object = self.repo.find_object(oid, Some(ObjectType::Commit))?;
        let signature = self.signature()?;
        self.repo.tag(&tag.name, &object, &signature, &tag.message(), true)?;

        self.push_refspecs(&[format!("+refs/tags/{}:refs/tags/{}", tag.name, tag.name)])?;
        tracing::info!(tag = %tag.name, commit = %tag.commit, "Moved tag");
        Ok(())
    }

    fn get_tag(&self, name: &str) -> Result<Option<Tag>> {
        let reference = match self.repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let commit = reference.peel_to_commit()?.id().to_string();
        let index_checksum = reference
            .peel_to_tag()
            .ok()
            .and_then(|tag| tag.message().and_then(Tag::checksum_from_message));

        Ok(Some(Tag::new(name, commit, index_checksum)))
    }

    fn delete_tag(&mut self, name: &str) -> Result<()> {
        if self.get_tag(name)?.is_none() {
            return Ok(());
        }

        self.repo.tag_delete(name)?;
        self.push_refspecs(&[format!(":refs/tags/{}", name)])?;
        tracing::debug!(tag = %name, "Deleted tag");
        Ok(())
    }

    fn file_at(&self, commit: &str, path: &Path) -> Result<Option<String>> {
        let commit = self.repo.find_commit(helpers::parse_oid(commit)?)?;
        let tree = commit.tree()?;

        let entry = match tree.get_path(path) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let object = entry.to_object(&self.repo)?;
        Ok(object
            .as_blob()
            .map(|blob| String::from_utf8_lossy(blob.content()).into_owned()))
    }

    fn get_pull_request(&self, head: &str) -> Result<Option<PullRequest>> {
        let Some(host) = self.host.as_deref() else {
            tracing::debug!("No pull request host configured");
            return Ok(None);
        };

        let pulls = host.list(head)?;
        Ok(pulls
            .iter()
            .find(|pr| pr.is_open())
            .or_else(|| pulls.first())
            .cloned())
    }

    fn open_pull_request(
        &mut self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let host = self.host()?;

        if let Some(existing) = host
            .list(head)?
            .into_iter()
            .find(|pr| pr.is_open() && pr.base == base)
        {
            return Err(Error::PullRequestExists {
                number: existing.number,
                head: head.to_string(),
                base: base.to_string(),
            });
        }

        let pr = host.open(head, base, title, body)?;
        tracing::info!(number = pr.number, head = %head, base = %base, "Opened pull request");
        Ok(pr)
    }

    fn edit_pull_request(&mut self, number: u64, state: PullRequestState) -> Result<()> {
        self.host()?.set_state(number, state)
    }
}
