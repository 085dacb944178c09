//! Filesystem layer for docsync
//!
//! Provides the document tree scanner, configuration loading and the atomic
//! write primitives used when remote edits are pulled into the repository.

pub mod backup;
pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod scan;

pub use backup::DocsBackup;
pub use config::{CONFIG_FILE_NAME, ConfigStore, DocsSection, RepositorySection, ServerSection, SyncConfig};
pub use error::{Error, Result};
pub use layout::DocsLayout;
pub use scan::{DocumentTree, INDEX_FILE_NAME, scan};
