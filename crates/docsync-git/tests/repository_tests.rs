//! Tests for the git2-backed repository client against a local bare remote

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use docsync_git::{
    BASE_TAG_NAME, Error, FEATURE_BRANCH_NAME, GitRepository, PullRequest, PullRequestHost,
    PullRequestState, RepositoryClient, Tag,
};
use git2::{Repository, RepositoryInitOptions};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    remote: PathBuf,
    client: GitRepository,
}

fn init(path: &Path, bare: bool) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main").bare(bare);
    Repository::init_opts(path, &opts).unwrap()
}

fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let remote = dir.path().join("remote.git");
    let work = dir.path().join("work");
    init(&remote, true);
    let repo = init(&work, false);
    repo.remote("origin", remote.to_str().unwrap()).unwrap();

    fs::create_dir_all(work.join("docs")).unwrap();
    fs::write(work.join("README.md"), "# Charm\n").unwrap();
    fs::write(work.join("docs/overview.md"), "# Overview\n").unwrap();

    let mut client = GitRepository::open(&work, "origin").unwrap();
    client
        .commit("Initial commit", &[Path::new("README.md"), Path::new("docs")])
        .unwrap()
        .unwrap();
    client.push("main", false).unwrap();

    Fixture {
        _dir: dir,
        remote,
        client,
    }
}

fn clone_remote(fixture: &Fixture, name: &str) -> GitRepository {
    let path = fixture.remote.parent().unwrap().join(name);
    Repository::clone(fixture.remote.to_str().unwrap(), &path).unwrap();
    GitRepository::open(&path, "origin").unwrap()
}

#[test]
fn commit_skips_unchanged_tree() {
    let mut fixture = setup();
    let result = fixture.client.commit("Nothing", &[Path::new("docs")]).unwrap();
    assert_eq!(result, None);
}

#[test]
fn commit_records_deleted_files() {
    let mut fixture = setup();
    let before = fixture.client.current_commit().unwrap();
    fs::remove_file(fixture.client.root().join("docs/overview.md")).unwrap();

    let after = fixture
        .client
        .commit("Remove overview", &[Path::new("docs")])
        .unwrap()
        .unwrap();

    let path = Path::new("docs/overview.md");
    assert_eq!(
        fixture.client.file_at(&before, path).unwrap().as_deref(),
        Some("# Overview\n")
    );
    assert_eq!(fixture.client.file_at(&after, path).unwrap(), None);
}

#[test]
fn tag_round_trip_carries_checksum() {
    let mut fixture = setup();
    let commit = fixture.client.current_commit().unwrap();
    let tag = Tag::new(BASE_TAG_NAME, &commit, Some("sha256:abc".to_string()));

    fixture.client.tag(&tag).unwrap();

    assert_eq!(fixture.client.get_tag(BASE_TAG_NAME).unwrap(), Some(tag));
    assert_eq!(fixture.client.tag_exists(BASE_TAG_NAME).unwrap(), Some(commit));
    let remote = Repository::open_bare(&fixture.remote).unwrap();
    assert!(remote.find_reference("refs/tags/docsync/base-content").is_ok());
}

#[test]
fn tag_moves_forward_when_retagged() {
    let mut fixture = setup();
    let first = fixture.client.current_commit().unwrap();
    fixture
        .client
        .tag(&Tag::new(BASE_TAG_NAME, &first, None))
        .unwrap();

    fs::write(fixture.client.root().join("docs/overview.md"), "# Overview\n\nMore.\n").unwrap();
    let second = fixture
        .client
        .commit("Expand overview", &[Path::new("docs")])
        .unwrap()
        .unwrap();
    fixture
        .client
        .tag(&Tag::new(BASE_TAG_NAME, &second, Some("sha256:def".into())))
        .unwrap();

    let tag = fixture.client.get_tag(BASE_TAG_NAME).unwrap().unwrap();
    assert_eq!(tag.commit, second);
    assert_eq!(tag.index_checksum.as_deref(), Some("sha256:def"));
}

#[test]
fn delete_tag_removes_remote_tag() {
    let mut fixture = setup();
    let commit = fixture.client.current_commit().unwrap();
    fixture
        .client
        .tag(&Tag::new(BASE_TAG_NAME, commit, None))
        .unwrap();

    fixture.client.delete_tag(BASE_TAG_NAME).unwrap();
    fixture.client.delete_tag(BASE_TAG_NAME).unwrap();

    assert_eq!(fixture.client.get_tag(BASE_TAG_NAME).unwrap(), None);
    let remote = Repository::open_bare(&fixture.remote).unwrap();
    assert!(remote.find_reference("refs/tags/docsync/base-content").is_err());
}

#[test]
fn feature_branch_lifecycle() {
    let mut fixture = setup();
    let page = fixture.client.root().join("docs/overview.md");

    fixture.client.create_branch(FEATURE_BRANCH_NAME, "main").unwrap();
    fixture.client.switch(FEATURE_BRANCH_NAME).unwrap();
    assert_eq!(fixture.client.current_branch().unwrap(), FEATURE_BRANCH_NAME);

    fs::write(&page, "# Overview\n\nRemote edit.\n").unwrap();
    fixture
        .client
        .commit("Remote edits", &[Path::new("docs")])
        .unwrap()
        .unwrap();
    fixture.client.push(FEATURE_BRANCH_NAME, true).unwrap();

    fixture.client.switch("main").unwrap();
    assert_eq!(fs::read_to_string(&page).unwrap(), "# Overview\n");

    fixture.client.fetch().unwrap();
    assert!(fixture.client.branch_exists(FEATURE_BRANCH_NAME).unwrap());

    fixture.client.delete_branch(FEATURE_BRANCH_NAME).unwrap();

    assert!(!fixture.client.branch_exists(FEATURE_BRANCH_NAME).unwrap());
    let remote = Repository::open_bare(&fixture.remote).unwrap();
    assert!(remote.find_reference("refs/heads/docsync/update").is_err());
}

#[test]
fn switch_keeps_uncommitted_edits_outside_the_docs() {
    let mut fixture = setup();
    let root = fixture.client.root().to_path_buf();
    fs::write(root.join("README.md"), "# Charm\n\nUnsaved.\n").unwrap();
    fs::write(root.join("docsync.toml"), "[server]\n").unwrap();

    fixture.client.create_branch(FEATURE_BRANCH_NAME, "main").unwrap();
    fixture.client.switch(FEATURE_BRANCH_NAME).unwrap();
    fs::write(root.join("docs/overview.md"), "# Overview\n\nRemote edit.\n").unwrap();
    fixture
        .client
        .commit("Remote edits", &[Path::new("docs/overview.md")])
        .unwrap()
        .unwrap();
    fixture.client.switch("main").unwrap();

    assert_eq!(
        fs::read_to_string(root.join("README.md")).unwrap(),
        "# Charm\n\nUnsaved.\n"
    );
    assert_eq!(fs::read_to_string(root.join("docsync.toml")).unwrap(), "[server]\n");
    assert_eq!(
        fs::read_to_string(root.join("docs/overview.md")).unwrap(),
        "# Overview\n"
    );
}

#[test]
fn switch_refuses_to_overwrite_uncommitted_edits() {
    let mut fixture = setup();
    let page = fixture.client.root().join("docs/overview.md");

    fixture.client.create_branch(FEATURE_BRANCH_NAME, "main").unwrap();
    fixture.client.switch(FEATURE_BRANCH_NAME).unwrap();
    fs::write(&page, "# Overview\n\nRemote edit.\n").unwrap();
    fixture
        .client
        .commit("Remote edits", &[Path::new("docs")])
        .unwrap()
        .unwrap();
    fs::write(&page, "# Overview\n\nUnsaved.\n").unwrap();

    let err = fixture.client.switch("main").unwrap_err();

    assert!(matches!(err, Error::UncommittedChanges { .. }), "{err}");
    assert_eq!(fs::read_to_string(&page).unwrap(), "# Overview\n\nUnsaved.\n");
    assert_eq!(fixture.client.current_branch().unwrap(), FEATURE_BRANCH_NAME);
}

#[test]
fn switch_creates_local_branch_from_remote() {
    let mut fixture = setup();
    let mut other = clone_remote(&fixture, "other");
    other.create_branch(FEATURE_BRANCH_NAME, "main").unwrap();
    other.push(FEATURE_BRANCH_NAME, true).unwrap();

    fixture.client.fetch().unwrap();
    fixture.client.switch(FEATURE_BRANCH_NAME).unwrap();

    assert_eq!(fixture.client.current_branch().unwrap(), FEATURE_BRANCH_NAME);
}

#[test]
fn pull_fast_forwards_to_remote() {
    let mut fixture = setup();
    let mut other = clone_remote(&fixture, "other");
    fs::write(other.root().join("docs/overview.md"), "# Overview\n\nMerged.\n").unwrap();
    let merged = other
        .commit("Merge docs", &[Path::new("docs")])
        .unwrap()
        .unwrap();
    other.push("main", false).unwrap();

    fixture.client.pull("main").unwrap();

    assert_eq!(fixture.client.current_commit().unwrap(), merged);
    assert_eq!(
        fs::read_to_string(fixture.client.root().join("docs/overview.md")).unwrap(),
        "# Overview\n\nMerged.\n"
    );
}

#[test]
fn pull_refuses_diverged_history() {
    let mut fixture = setup();
    let mut other = clone_remote(&fixture, "other");
    fs::write(other.root().join("docs/overview.md"), "theirs\n").unwrap();
    other.commit("Theirs", &[Path::new("docs")]).unwrap();
    other.push("main", false).unwrap();

    fs::write(fixture.client.root().join("docs/overview.md"), "ours\n").unwrap();
    fixture.client.commit("Ours", &[Path::new("docs")]).unwrap();

    let err = fixture.client.pull("main").unwrap_err();
    assert!(matches!(err, Error::CannotFastForward { .. }), "{err}");
}

#[test]
fn push_without_remote_fails() {
    let dir = TempDir::new().unwrap();
    init(dir.path(), false);
    fs::write(dir.path().join("a.md"), "a").unwrap();
    let mut client = GitRepository::open(dir.path(), "origin").unwrap();
    client.commit("a", &[Path::new("a.md")]).unwrap();

    let err = client.push("main", false).unwrap_err();
    assert!(matches!(err, Error::RemoteNotFound { .. }));
}

#[test]
fn pull_requests_need_a_host() {
    let mut fixture = setup();
    assert_eq!(fixture.client.get_pull_request(FEATURE_BRANCH_NAME).unwrap(), None);
    let err = fixture
        .client
        .open_pull_request(FEATURE_BRANCH_NAME, "main", "t", "b")
        .unwrap_err();
    assert!(matches!(err, Error::NoPullRequestHost));
}

#[derive(Clone, Default)]
struct RecordingHost {
    pulls: Rc<RefCell<Vec<PullRequest>>>,
}

impl PullRequestHost for RecordingHost {
    fn list(&self, head: &str) -> docsync_git::Result<Vec<PullRequest>> {
        let mut pulls: Vec<_> = self
            .pulls
            .borrow()
            .iter()
            .filter(|pr| pr.head == head)
            .cloned()
            .collect();
        pulls.reverse();
        Ok(pulls)
    }

    fn open(&self, head: &str, base: &str, _title: &str, _body: &str) -> docsync_git::Result<PullRequest> {
        let pr = PullRequest {
            number: self.pulls.borrow().len() as u64 + 1,
            head: head.to_string(),
            base: base.to_string(),
            state: PullRequestState::Open,
            merged: false,
            url: None,
        };
        self.pulls.borrow_mut().push(pr.clone());
        Ok(pr)
    }

    fn set_state(&self, number: u64, state: PullRequestState) -> docsync_git::Result<()> {
        let mut pulls = self.pulls.borrow_mut();
        let pr = pulls
            .iter_mut()
            .find(|pr| pr.number == number)
            .ok_or(Error::PullRequestNotFound { number })?;
        pr.state = state;
        Ok(())
    }
}

#[test]
fn second_open_pull_request_is_rejected() {
    let host = RecordingHost::default();
    let fixture = setup();
    let mut client = fixture.client.with_host(host.clone());

    let first = client
        .open_pull_request(FEATURE_BRANCH_NAME, "main", "Docs", "body")
        .unwrap();
    let err = client
        .open_pull_request(FEATURE_BRANCH_NAME, "main", "Docs", "body")
        .unwrap_err();
    assert!(matches!(err, Error::PullRequestExists { number: 1, .. }));

    client
        .edit_pull_request(first.number, PullRequestState::Closed)
        .unwrap();
    let current = client.get_pull_request(FEATURE_BRANCH_NAME).unwrap().unwrap();
    assert_eq!(current.state, PullRequestState::Closed);

    let reopened = client
        .open_pull_request(FEATURE_BRANCH_NAME, "main", "Docs", "body")
        .unwrap();
    assert_eq!(reopened.number, 2);
    assert_eq!(
        client.get_pull_request(FEATURE_BRANCH_NAME).unwrap().unwrap().number,
        2
    );
}
