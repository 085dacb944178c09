//! Repository plumbing for docsync
//!
//! [`RepositoryClient`] is the capability the reconciliation engine needs from
//! version control: branches, commits, the base-content tag and the pull
//! request used to surface conflicts. [`GitRepository`] implements it on top
//! of `git2`, delegating pull requests to a [`PullRequestHost`].

pub mod client;
pub mod error;
pub mod github;
pub mod helpers;
pub mod repository;
pub mod types;

pub use client::{PullRequestHost, RepositoryClient};
pub use error::{Error, Result};
pub use github::GithubHost;
pub use repository::GitRepository;
pub use types::{BASE_TAG_NAME, FEATURE_BRANCH_NAME, PullRequest, PullRequestState, Tag};
