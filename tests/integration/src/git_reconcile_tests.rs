//! End-to-end reconciliation against a real git repository
//!
//! Exercises the full flow: scan -> index -> plan -> execute -> commit, push
//! and tag, with a bare remote standing in for the hosted repository and an
//! in-memory content server.

use std::path::{Path, PathBuf};

use docsync_core::{CoordinatorState, Mode, Outcome, RunReport, Session, SyncOptions, reconcile};
use docsync_git::{BASE_TAG_NAME, FEATURE_BRANCH_NAME, GitRepository};
use docsync_nav::{IndexPage, PagePath};
use docsync_test_utils::git::{clone_remote, commit_and_publish};
use docsync_test_utils::{DocsFixture, MemoryServer};
use git2::Repository;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

struct Setup {
    fixture: DocsFixture,
    remote: PathBuf,
    _remote_dir: TempDir,
    server: MemoryServer,
}

impl Setup {
    fn new(pages: &[(&str, &str)]) -> Self {
        let fixture = DocsFixture::new();
        for (path, content) in pages {
            fixture.page(path, content);
        }
        let remote_dir = TempDir::new().unwrap();
        let remote = commit_and_publish(fixture.root(), &remote_dir.path().join("remote.git"));
        Self {
            fixture,
            remote,
            _remote_dir: remote_dir,
            server: MemoryServer::new(),
        }
    }

    fn run(&mut self, mode: Mode) -> RunReport {
        let config = self.fixture.config();
        let mut repository =
            GitRepository::open(self.fixture.root(), "origin").expect("Should open repository");
        let mut session = Session::new(
            &mut repository,
            &mut self.server,
            self.fixture.layout(),
            SyncOptions::from_config(&config),
            config.server.index_url.clone(),
        );
        reconcile(&mut session, mode).expect("Run should succeed")
    }

    fn url_of(&self, path: &str) -> String {
        let index_url = self.fixture.config().server.index_url.expect("index URL");
        let body = self.server.content(&index_url).expect("index topic");
        let page = IndexPage::parse(body).expect("Index should parse");
        let path: PagePath = path.parse().expect("valid path");
        page.table
            .get(&path)
            .and_then(|row| row.link.clone())
            .expect("Row should be linked")
    }

    fn bare(&self) -> Repository {
        Repository::open(&self.remote).expect("Should open bare remote")
    }

    /// Content of `path` at `reference` on the remote.
    fn remote_file(&self, reference: &str, path: &str) -> Option<String> {
        let bare = self.bare();
        let object = bare.revparse_single(&format!("{reference}:{path}")).ok()?;
        let blob = object.as_blob()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    fn remote_tag_commit(&self) -> Option<String> {
        let bare = self.bare();
        let reference = bare.find_reference(&format!("refs/tags/{BASE_TAG_NAME}")).ok()?;
        Some(reference.peel_to_commit().ok()?.id().to_string())
    }
}

fn path(s: &str) -> PagePath {
    s.parse().expect("valid path")
}

#[test]
fn test_first_run_pushes_config_and_tag() {
    let mut setup = Setup::new(&[
        ("overview.md", "# Overview\n"),
        ("how-to/install.md", "# Install\n"),
    ]);

    let report = setup.run(Mode::Create);

    assert_eq!(report.outcomes.len(), 3);
    let commit = report.commit.clone().expect("Config change should be committed");
    assert_eq!(setup.remote_tag_commit(), Some(commit.clone()));
    assert_eq!(report.tag.map(|t| t.commit), Some(commit));

    let config = setup
        .remote_file("refs/heads/main", "docsync.toml")
        .expect("Config should be on the remote");
    assert!(config.contains("index_url"));
    assert!(config.starts_with("# docsync configuration"));

    let clone_dir = TempDir::new().unwrap();
    clone_remote(&setup.remote, clone_dir.path());
    assert!(Path::new(&clone_dir.path().join("docs/how-to/install.md")).exists());
}

#[test]
fn test_second_run_is_idempotent() {
    let mut setup = Setup::new(&[("overview.md", "# Overview\n")]);
    let first = setup.run(Mode::Create);
    setup.server.clear_mutations();

    let second = setup.run(Mode::Update);

    assert!(second.outcomes.is_empty());
    assert_eq!(second.commit, None);
    assert_eq!(second.tag, first.tag);
    assert!(setup.server.mutations().is_empty());
}

#[test]
fn test_remote_edit_is_pulled_and_pushed() {
    let mut setup = Setup::new(&[("overview.md", "Original\n")]);
    setup.run(Mode::Create);
    let url = setup.url_of("overview");
    setup.server.edit(&url, "Edited on the forum\n");

    let report = setup.run(Mode::Update);

    assert_eq!(report.outcomes[&path("overview")], Outcome::Pulled { url });
    assert_eq!(
        setup.remote_file("refs/heads/main", "docs/overview.md").as_deref(),
        Some("Edited on the forum\n")
    );
    assert_eq!(setup.remote_tag_commit(), report.tag.map(|t| t.commit));
}

#[test]
fn test_conflict_publishes_feature_branch() {
    let mut setup = Setup::new(&[("overview.md", "X [base]\n")]);
    let first = setup.run(Mode::Create);
    let url = setup.url_of("overview");
    setup.fixture.page("overview.md", "X [A]\n");
    setup.server.edit(&url, "X [B]\n");

    let report = setup.run(Mode::Update);

    // Without a pull request host the branch is published but no PR opened.
    assert_eq!(report.state, CoordinatorState::Branched);
    assert!(matches!(report.outcomes[&path("overview")], Outcome::Failed { .. }));
    assert_eq!(
        setup
            .remote_file(&format!("refs/heads/{FEATURE_BRANCH_NAME}"), "docs/overview.md")
            .as_deref(),
        Some("X [B]\n")
    );
    assert_eq!(setup.fixture.read("docs/overview.md"), "X [A]\n");
    assert_eq!(
        setup.remote_file("refs/heads/main", "docs/overview.md").as_deref(),
        Some("X [A]\n")
    );
    assert_eq!(setup.server.content(&url), Some("X [B]\n"));
    assert_eq!(setup.remote_tag_commit(), first.tag.map(|t| t.commit));
}

#[test]
fn test_delete_removes_page_everywhere() {
    let mut setup = Setup::new(&[("overview.md", "# Overview\n"), ("old.md", "# Old\n")]);
    setup.run(Mode::Create);
    let url = setup.url_of("old");
    setup.fixture.remove("docs/old.md");

    let report = setup.run(Mode::Delete);

    assert_eq!(report.outcomes[&path("old")], Outcome::Deleted { url: url.clone() });
    assert!(setup.server.is_deleted(&url));
    assert_eq!(setup.remote_file("refs/heads/main", "docs/old.md"), None);
}
