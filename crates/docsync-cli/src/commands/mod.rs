//! Command implementations for docsync-cli

pub mod check;
pub mod cleanup;
pub mod reconcile;

pub use check::run_check_pull_request;
pub use cleanup::run_cleanup;
pub use reconcile::run_reconcile;
