//! Per-run state shared by the coordinator and the executor

use docsync_fs::{DocsLayout, SyncConfig};
use docsync_git::{BASE_TAG_NAME, FEATURE_BRANCH_NAME, RepositoryClient, Tag};
use docsync_server::ContentServer;

use crate::Result;

/// Edit reason recorded on topic updates.
pub const DEFAULT_EDIT_REASON: &str = "Synchronised from the documentation repository";

/// Names and texts used during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub base_branch: String,
    pub feature_branch: String,
    pub tag_name: String,
    /// Title of the index topic when it is first created.
    pub index_title: String,
    pub edit_reason: String,
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            base_branch: config.repository.base_branch.clone(),
            index_title: config.docs.index_title.clone(),
            ..Self::default()
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            base_branch: "main".to_string(),
            feature_branch: FEATURE_BRANCH_NAME.to_string(),
            tag_name: BASE_TAG_NAME.to_string(),
            index_title: "Documentation".to_string(),
            edit_reason: DEFAULT_EDIT_REASON.to_string(),
        }
    }
}

/// Clients, layout and durable state threaded through a run.
pub struct Session<'a> {
    pub(crate) repository: &'a mut dyn RepositoryClient,
    pub(crate) server: &'a mut dyn ContentServer,
    pub(crate) layout: DocsLayout,
    pub(crate) options: SyncOptions,
    pub(crate) index_url: Option<String>,
    pub(crate) tag: Option<Tag>,
}

impl<'a> Session<'a> {
    pub fn new(
        repository: &'a mut dyn RepositoryClient,
        server: &'a mut dyn ContentServer,
        layout: DocsLayout,
        options: SyncOptions,
        index_url: Option<String>,
    ) -> Self {
        Self {
            repository,
            server,
            layout,
            options,
            index_url,
            tag: None,
        }
    }

    pub fn layout(&self) -> &DocsLayout {
        &self.layout
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// URL of the index topic, once known.
    pub fn index_url(&self) -> Option<&str> {
        self.index_url.as_deref()
    }

    /// Base-content tag as last loaded or moved.
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Read the base-content tag from the repository.
    pub fn load_tag(&mut self) -> Result<Option<&Tag>> {
        self.tag = self.repository.get_tag(&self.options.tag_name)?;
        Ok(self.tag.as_ref())
    }

    /// Move the base-content tag, skipping the move when nothing changed.
    pub(crate) fn advance_tag(&mut self, commit: String, index_checksum: Option<String>) -> Result<bool> {
        let tag = Tag::new(self.options.tag_name.clone(), commit, index_checksum);
        if self.tag.as_ref() == Some(&tag) {
            return Ok(false);
        }
        self.repository.tag(&tag)?;
        tracing::info!(tag = %tag.name, commit = %tag.commit, "Advanced base-content tag");
        self.tag = Some(tag);
        Ok(true)
    }
}
