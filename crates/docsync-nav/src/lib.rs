//! Navigation table model for docsync
//!
//! The index page on the content server carries an ordered outline of every
//! synced page. This crate owns that outline:
//!
//! - [`PagePath`]: hierarchical slug path identifying a page
//! - [`Page`]: a local documentation page or group header
//! - [`NavigationTable`]: the flat, depth-annotated table of rows
//! - [`IndexPage`]: the whole index page body (intro text plus table)
//!
//! # Markup
//!
//! ```text
//! Intro text written by humans.
//!
//! # Navigation
//!
//! | Level | Path | Navlink |
//! | -- | -- | -- |
//! | 1 | tutorials | [Tutorials]() |
//! | 2 | t-overview | [Overview](https://forum.example/t/overview/12) |
//! ```
//!
//! Parsing rebuilds each row's full path with an explicit depth stack; rows
//! reference their parent by table index.

pub mod error;
pub mod index_page;
pub mod page;
pub mod path;
pub mod table;

pub use error::{Error, Result};
pub use index_page::{IndexPage, NAVIGATION_HEADING};
pub use page::Page;
pub use path::{PagePath, validate_slug};
pub use table::{NavigationRow, NavigationTable};
