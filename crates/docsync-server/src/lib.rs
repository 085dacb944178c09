//! Content server access for docsync
//!
//! [`ContentServer`] is the capability the reconciliation engine needs from
//! the forum hosting the documentation topics. [`DiscourseClient`] implements
//! it against the Discourse REST API.

pub mod client;
pub mod discourse;
pub mod error;

pub use client::ContentServer;
pub use discourse::{DiscourseClient, DiscourseConfig, topic_id};
pub use error::{Error, Result};
