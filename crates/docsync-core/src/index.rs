//! Pairing of the local tree with the live server state

use std::collections::BTreeMap;

use docsync_fs::DocumentTree;
use docsync_fs::checksum::compute_content_checksum;
use docsync_nav::{IndexPage, PagePath};
use docsync_server::ContentServer;

use crate::{Error, Result};

/// Live state of the content server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIndex {
    pub url: String,
    /// Raw index page body as retrieved.
    pub body: String,
    pub page: IndexPage,
    /// Live content of every linked row's topic.
    pub topics: BTreeMap<PagePath, String>,
}

impl ServerIndex {
    pub fn topic(&self, path: &PagePath) -> Option<&str> {
        self.topics.get(path).map(String::as_str)
    }
}

/// Both sides of a reconciliation. `server` is `None` until an index topic
/// exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub local: DocumentTree,
    pub server: Option<ServerIndex>,
}

/// Checksum recorded on the base-content tag for an index page body.
pub fn index_checksum(body: &str) -> String {
    compute_content_checksum(body.trim_end())
}

/// Retrieve the index page and every linked topic.
///
/// Any retrieval failure is fatal: nothing has been mutated yet, and planning
/// against a partial view could delete or overwrite content.
pub fn build_index(
    local: DocumentTree,
    server: &dyn ContentServer,
    index_url: Option<&str>,
) -> Result<Index> {
    let Some(url) = index_url else {
        tracing::info!("No index topic configured; every page will be created");
        return Ok(Index {
            local,
            server: None,
        });
    };

    let body = server
        .retrieve_topic(url)
        .map_err(|source| Error::IndexUnavailable {
            url: url.to_string(),
            source,
        })?;
    let page = IndexPage::parse(&body)?;

    let mut topics = BTreeMap::new();
    for row in page.table.iter() {
        let Some(link) = &row.link else {
            continue;
        };
        let content = server
            .retrieve_topic(link)
            .map_err(|source| Error::TopicUnavailable {
                path: row.path.clone(),
                url: link.clone(),
                source,
            })?;
        topics.insert(row.path.clone(), content);
    }

    tracing::debug!(url = %url, rows = page.table.len(), topics = topics.len(), "Built server index");
    Ok(Index {
        local,
        server: Some(ServerIndex {
            url: url.to_string(),
            body,
            page,
            topics,
        }),
    })
}
