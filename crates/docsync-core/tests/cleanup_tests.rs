//! Teardown of published topics, tag, pull request and branch

use docsync_core::{Mode, Session, SyncOptions, cleanup, reconcile};
use docsync_git::{BASE_TAG_NAME, FEATURE_BRANCH_NAME, RepositoryClient};
use docsync_test_utils::{DocsFixture, MemoryRepository, MemoryServer};

/// Two published pages; returns every URL the run reported.
fn published() -> (DocsFixture, MemoryRepository, MemoryServer, Vec<String>) {
    let fixture = DocsFixture::new();
    fixture.page("a.md", "# A\n").page("b.md", "# B\n");
    let mut repo = MemoryRepository::new(fixture.root());
    let mut server = MemoryServer::new();

    let report = {
        let mut session = Session::new(
            &mut repo,
            &mut server,
            fixture.layout(),
            SyncOptions::default(),
            None,
        );
        reconcile(&mut session, Mode::Create).expect("Run should succeed")
    };
    let urls = report.urls_with_actions().into_keys().collect();
    (fixture, repo, server, urls)
}

#[test]
fn test_cleanup_removes_everything() {
    let (_fixture, mut repo, mut server, urls) = published();
    assert_eq!(urls.len(), 3);

    let ok = cleanup(&mut repo, &mut server, &SyncOptions::default(), &urls);

    assert!(ok);
    assert!(server.live_urls().is_empty());
    assert_eq!(repo.get_tag(BASE_TAG_NAME).expect("lookup"), None);
}

#[test]
fn test_cleanup_continues_after_failures() {
    let (_fixture, mut repo, mut server, urls) = published();
    server.fail_delete(&urls[0]);

    let ok = cleanup(&mut repo, &mut server, &SyncOptions::default(), &urls);

    assert!(!ok);
    assert_eq!(server.live_urls(), vec![urls[0].clone()]);
    assert_eq!(repo.get_tag(BASE_TAG_NAME).expect("lookup"), None);
}

#[test]
fn test_cleanup_tolerates_missing_topics() {
    let (_fixture, mut repo, mut server, urls) = published();
    let options = SyncOptions::default();
    assert!(cleanup(&mut repo, &mut server, &options, &urls));

    assert!(cleanup(&mut repo, &mut server, &options, &urls));
}

#[test]
fn test_cleanup_closes_pull_request_and_deletes_branch() {
    let (_fixture, mut repo, mut server, urls) = published();
    repo.create_branch(FEATURE_BRANCH_NAME, "main").expect("branch");
    repo.push(FEATURE_BRANCH_NAME, true).expect("push");
    let pr = repo
        .open_pull_request(FEATURE_BRANCH_NAME, "main", "t", "b")
        .expect("open");

    let ok = cleanup(&mut repo, &mut server, &SyncOptions::default(), &urls);

    assert!(ok);
    let pr = repo
        .get_pull_request(FEATURE_BRANCH_NAME)
        .expect("lookup")
        .filter(|p| p.number == pr.number)
        .expect("Pull request should still be listed");
    assert!(!pr.is_open());
    assert!(!repo.branch_exists(FEATURE_BRANCH_NAME).expect("branches"));
}
