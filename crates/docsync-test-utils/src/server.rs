//! In-memory content server.

use std::collections::{BTreeMap, BTreeSet};

use docsync_server::{ContentServer, Error, Result};

use crate::TEST_HOST;

/// A recorded server mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Created { url: String, title: String },
    Updated { url: String },
    Deleted { url: String },
}

#[derive(Debug, Clone)]
struct Topic {
    title: String,
    content: String,
    deleted: bool,
}

/// [`ContentServer`] keeping topics in memory, with failure injection.
///
/// Deleted topics are kept so tests can tell a soft removal (row removed,
/// topic live) from a hard one.
#[derive(Debug, Clone)]
pub struct MemoryServer {
    base_url: String,
    topics: BTreeMap<String, Topic>,
    next_id: u64,
    mutations: Vec<Mutation>,
    failing_retrieves: BTreeSet<String>,
    failing_creates: BTreeSet<String>,
    failing_updates: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self {
            base_url: TEST_HOST.to_string(),
            topics: BTreeMap::new(),
            next_id: 1,
            mutations: Vec::new(),
            failing_retrieves: BTreeSet::new(),
            failing_creates: BTreeSet::new(),
            failing_updates: BTreeSet::new(),
            failing_deletes: BTreeSet::new(),
        }
    }

    /// Add a topic without recording a mutation and return its URL.
    pub fn insert(&mut self, title: &str, content: &str) -> String {
        let slug: String = title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let url = format!("{}/t/{}/{}", self.base_url, slug, self.next_id);
        self.next_id += 1;
        self.topics.insert(
            url.clone(),
            Topic {
                title: title.to_string(),
                content: content.to_string(),
                deleted: false,
            },
        );
        url
    }

    /// Simulate an edit made by a forum user.
    ///
    /// # Panics
    /// Panics when the topic does not exist.
    pub fn edit(&mut self, url: &str, content: &str) {
        let topic = self
            .topics
            .get_mut(url)
            .unwrap_or_else(|| panic!("MemoryServer::edit: no topic at {url}"));
        topic.content = content.to_string();
    }

    /// Live content of a topic; `None` when missing or deleted.
    pub fn content(&self, url: &str) -> Option<&str> {
        self.topics
            .get(url)
            .filter(|t| !t.deleted)
            .map(|t| t.content.as_str())
    }

    pub fn title(&self, url: &str) -> Option<&str> {
        self.topics.get(url).map(|t| t.title.as_str())
    }

    /// Whether the topic exists and was deleted.
    pub fn is_deleted(&self, url: &str) -> bool {
        self.topics.get(url).is_some_and(|t| t.deleted)
    }

    /// URLs of topics that are not deleted.
    pub fn live_urls(&self) -> Vec<String> {
        self.topics
            .iter()
            .filter(|(_, t)| !t.deleted)
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn clear_mutations(&mut self) {
        self.mutations.clear();
    }

    pub fn fail_retrieve(&mut self, url: &str) {
        self.failing_retrieves.insert(url.to_string());
    }

    /// Fail creation of topics with this title.
    pub fn fail_create(&mut self, title: &str) {
        self.failing_creates.insert(title.to_string());
    }

    pub fn fail_update(&mut self, url: &str) {
        self.failing_updates.insert(url.to_string());
    }

    pub fn fail_delete(&mut self, url: &str) {
        self.failing_deletes.insert(url.to_string());
    }

    /// Drop every injected failure.
    pub fn clear_failures(&mut self) {
        self.failing_retrieves.clear();
        self.failing_creates.clear();
        self.failing_updates.clear();
        self.failing_deletes.clear();
    }

    /// Live topics with this title.
    pub fn live_titled(&self, title: &str) -> Vec<String> {
        self.topics
            .iter()
            .filter(|(_, t)| !t.deleted && t.title == title)
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn live(&self, url: &str) -> Result<&Topic> {
        self.topics
            .get(url)
            .filter(|t| !t.deleted)
            .ok_or_else(|| Error::NotFound {
                url: url.to_string(),
            })
    }
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

fn injected(url: &str) -> Error {
    Error::Http {
        url: url.to_string(),
        status: 500,
        message: "injected failure".to_string(),
    }
}

impl ContentServer for MemoryServer {
    fn retrieve_topic(&self, url: &str) -> Result<String> {
        if self.failing_retrieves.contains(url) {
            return Err(injected(url));
        }
        Ok(self.live(url)?.content.clone())
    }

    fn create_topic(&mut self, title: &str, content: &str) -> Result<String> {
        if self.failing_creates.contains(title) {
            return Err(injected(&self.base_url));
        }
        let url = self.insert(title, content);
        self.mutations.push(Mutation::Created {
            url: url.clone(),
            title: title.to_string(),
        });
        Ok(url)
    }

    fn update_topic(&mut self, url: &str, content: &str, _edit_reason: &str) -> Result<()> {
        if self.failing_updates.contains(url) {
            return Err(injected(url));
        }
        self.live(url)?;
        self.edit(url, content);
        self.mutations.push(Mutation::Updated {
            url: url.to_string(),
        });
        Ok(())
    }

    fn delete_topic(&mut self, url: &str) -> Result<()> {
        if self.failing_deletes.contains(url) {
            return Err(injected(url));
        }
        self.live(url)?;
        if let Some(topic) = self.topics.get_mut(url) {
            topic.deleted = true;
        }
        self.mutations.push(Mutation::Deleted {
            url: url.to_string(),
        });
        Ok(())
    }
}
