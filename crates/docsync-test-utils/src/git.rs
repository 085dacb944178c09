//! Real git repositories backed by a local bare remote.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, RepositoryInitOptions, Signature};

/// Initialises a repository whose initial branch is `main`.
///
/// # Panics
/// Panics if `git2::Repository::init_opts` fails.
pub fn init_repo(path: &Path, bare: bool) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main").bare(bare);
    Repository::init_opts(path, &opts).unwrap_or_else(|e| {
        panic!(
            "init_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Turns an existing working directory into a repository with one commit
/// holding every file, pushed to a new bare remote named `origin`.
///
/// The bare remote is created at `remote`. Returns the remote path.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_and_publish(work: &Path, remote: &Path) -> PathBuf {
    init_repo(remote, true);
    let repo = init_repo(work, false);

    let mut config = repo
        .config()
        .unwrap_or_else(|e| panic!("commit_and_publish: no config: {e}"));
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .unwrap_or_else(|e| panic!("commit_and_publish: add failed: {e}"));
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("Test User", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &signature, &signature, "Initial commit", &tree, &[])
        .unwrap_or_else(|e| panic!("commit_and_publish: commit failed: {e}"));

    let remote_url = remote
        .to_str()
        .unwrap_or_else(|| panic!("commit_and_publish: non UTF-8 remote path"));
    let mut origin = repo.remote("origin", remote_url).unwrap();
    origin
        .push(&["refs/heads/main:refs/heads/main"], None)
        .unwrap_or_else(|e| panic!("commit_and_publish: push failed: {e}"));

    remote.to_path_buf()
}

/// Clone `remote` into `path` and return the clone.
///
/// # Panics
/// Panics if the clone fails.
pub fn clone_remote(remote: &Path, path: &Path) -> Repository {
    let url = remote
        .to_str()
        .unwrap_or_else(|| panic!("clone_remote: non UTF-8 remote path"));
    Repository::clone(url, path)
        .unwrap_or_else(|e| panic!("clone_remote: failed to clone {url}: {e}"))
}

/// Write `content` to `relative` in a working directory.
///
/// # Panics
/// Panics on filesystem errors.
pub fn write_file(work: &Path, relative: &str, content: &str) {
    let path = work.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content)
        .unwrap_or_else(|e| panic!("write_file: failed to write {}: {e}", path.display()));
}
