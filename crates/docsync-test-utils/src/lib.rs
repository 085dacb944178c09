//! Shared test utilities for the docsync workspace.
//!
//! This crate provides standardised test doubles and fixtures. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`docs`]: [`DocsFixture`] temporary repository with a docs tree and config
//! - [`git`]: real git repositories with a local bare remote
//! - [`repository`]: [`MemoryRepository`] in-memory [`RepositoryClient`](docsync_git::RepositoryClient)
//! - [`server`]: [`MemoryServer`] in-memory [`ContentServer`](docsync_server::ContentServer)

pub mod docs;
pub mod git;
pub mod repository;
pub mod server;

pub use docs::{DocsFixture, TEST_HOST};
pub use repository::MemoryRepository;
pub use server::{MemoryServer, Mutation};
