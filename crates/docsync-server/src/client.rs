//! Content server capability

use crate::Result;

/// Operations on the topics of a content server.
///
/// Topics are addressed by their public URL.
pub trait ContentServer {
    /// Raw content of the topic's first post.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) when the topic
    /// does not exist or was deleted.
    fn retrieve_topic(&self, url: &str) -> Result<String>;

    /// Create a topic and return its URL.
    fn create_topic(&mut self, title: &str, content: &str) -> Result<String>;

    /// Replace the topic's content, recording `edit_reason` in its history.
    fn update_topic(&mut self, url: &str, content: &str, edit_reason: &str) -> Result<()>;

    /// Delete the topic. Fails with `NotFound` when it is already gone.
    fn delete_topic(&mut self, url: &str) -> Result<()>;
}
