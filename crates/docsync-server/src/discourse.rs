//! Discourse REST API client

use std::sync::LazyLock;
use std::time::Duration;

use backoff::ExponentialBackoff;
use regex::Regex;
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{ContentServer, Error, Result};

/// Matches `/t/<slug>/<id>` and `/t/<id>`, optionally followed by a post number.
static TOPIC_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/t/(?:[^/]+/)?(\d+)(?:/\d+)?/?$").expect("Invalid regex pattern")
});

/// Connection settings for a Discourse instance.
#[derive(Debug, Clone)]
pub struct DiscourseConfig {
    pub base_url: String,
    pub api_username: String,
    pub api_key: String,
    /// Category new topics are filed under.
    pub category_id: Option<u64>,
    pub timeout: Duration,
    /// First delay before retrying a transient failure.
    pub retry_initial_interval: Duration,
    /// Give up retrying after this much time.
    pub retry_max_elapsed: Duration,
}

impl DiscourseConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_username: api_username.into(),
            api_key: api_key.into(),
            category_id: None,
            timeout: Duration::from_secs(30),
            retry_initial_interval: Duration::from_millis(500),
            retry_max_elapsed: Duration::from_secs(60),
        }
    }

    pub fn with_category(mut self, category_id: Option<u64>) -> Self {
        self.category_id = category_id;
        self
    }
}

/// Which failures a request may be re-sent after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Retry {
    /// Rate limiting, 5xx and connection errors.
    Transient,
    /// Rate limiting only: a 5xx or dropped connection may follow a write
    /// the server already made.
    RateLimited,
}

impl Retry {
    fn allows(self, error: &Error) -> bool {
        match self {
            Retry::Transient => error.is_transient(),
            Retry::RateLimited => matches!(error, Error::RateLimited { .. }),
        }
    }
}

/// Blocking Discourse client.
///
/// Transient failures (rate limiting, 5xx, connection errors) are retried
/// with exponential backoff; everything else is returned immediately.
/// Topic creation is only retried when rate limited.
#[derive(Debug, Clone)]
pub struct DiscourseClient {
    client: Client,
    config: DiscourseConfig,
}

impl DiscourseClient {
    pub fn new(config: DiscourseConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("docsync/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.config.api_key)
            .header("Api-Username", &self.config.api_username)
    }

    /// Send a request built by `build`, retrying the failures `retry` allows.
    fn send(&self, url: &str, retry: Retry, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let policy = ExponentialBackoff {
            initial_interval: self.config.retry_initial_interval,
            max_elapsed_time: Some(self.config.retry_max_elapsed),
            ..ExponentialBackoff::default()
        };

        let attempt = || {
            let result = build()
                .send()
                .map_err(|e| Error::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })
                .and_then(|response| check_status(url, response));

            result.map_err(|error| match error {
                Error::RateLimited {
                    retry_after: Some(delay),
                    ..
                } if retry.allows(&error) => {
                    tracing::warn!(url = %url, ?delay, "Rate limited, retrying");
                    backoff::Error::retry_after(error, delay)
                }
                error if retry.allows(&error) => {
                    tracing::warn!(url = %url, error = %error, "Transient failure, retrying");
                    backoff::Error::transient(error)
                }
                error => backoff::Error::permanent(error),
            })
        };

        backoff::retry(policy, attempt).map_err(|error| match error {
            backoff::Error::Permanent(error) => error,
            backoff::Error::Transient { err, .. } => err,
        })
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: Retry,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<T> {
        let response = self.send(url, retry, build)?;
        response.json().map_err(|e| Error::UnexpectedResponse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Topic metadata, treating soft-deleted topics as missing.
    fn topic(&self, url: &str) -> Result<TopicResponse> {
        let id = topic_id(url)?;
        let endpoint = self.endpoint(&format!("/t/{}.json", id));
        let topic: TopicResponse =
            self.send_json(&endpoint, Retry::Transient, || self.request(Method::GET, &endpoint))?;

        if topic.deleted_at.is_some() {
            return Err(Error::NotFound {
                url: url.to_string(),
            });
        }
        Ok(topic)
    }

    fn first_post_id(&self, url: &str) -> Result<u64> {
        self.topic(url)?
            .post_stream
            .posts
            .first()
            .map(|post| post.id)
            .ok_or_else(|| Error::UnexpectedResponse {
                url: url.to_string(),
                message: "topic has no posts".to_string(),
            })
    }
}

impl ContentServer for DiscourseClient {
    fn retrieve_topic(&self, url: &str) -> Result<String> {
        let post_id = self.first_post_id(url)?;
        let endpoint = self.endpoint(&format!("/posts/{}.json", post_id));
        let post: PostResponse =
            self.send_json(&endpoint, Retry::Transient, || self.request(Method::GET, &endpoint))?;
        tracing::debug!(url = %url, bytes = post.raw.len(), "Retrieved topic");
        Ok(post.raw)
    }

    fn create_topic(&mut self, title: &str, content: &str) -> Result<String> {
        let endpoint = self.endpoint("/posts.json");
        let mut body = json!({ "title": title, "raw": content });
        if let Some(category) = self.config.category_id {
            body["category"] = json!(category);
        }

        let created: CreatedPost = self.send_json(&endpoint, Retry::RateLimited, || {
            self.request(Method::POST, &endpoint).json(&body)
        })?;
        let url = self.endpoint(&format!("/t/{}/{}", created.topic_slug, created.topic_id));
        tracing::info!(url = %url, title = %title, "Created topic");
        Ok(url)
    }

    fn update_topic(&mut self, url: &str, content: &str, edit_reason: &str) -> Result<()> {
        let post_id = self.first_post_id(url)?;
        let endpoint = self.endpoint(&format!("/posts/{}.json", post_id));
        let body = json!({ "post": { "raw": content, "edit_reason": edit_reason } });

        self.send(&endpoint, Retry::Transient, || {
            self.request(Method::PUT, &endpoint).json(&body)
        })?;
        tracing::info!(url = %url, "Updated topic");
        Ok(())
    }

    fn delete_topic(&mut self, url: &str) -> Result<()> {
        let id = topic_id(url)?;
        let endpoint = self.endpoint(&format!("/t/{}.json", id));

        self.send(&endpoint, Retry::Transient, || self.request(Method::DELETE, &endpoint))
            .map_err(|error| match error {
                Error::NotFound { .. } => Error::NotFound {
                    url: url.to_string(),
                },
                other => other,
            })?;
        tracing::info!(url = %url, "Deleted topic");
        Ok(())
    }
}

/// Numeric topic id embedded in a topic URL.
pub fn topic_id(url: &str) -> Result<u64> {
    TOPIC_URL_REGEX
        .captures(url.split(['?', '#']).next().unwrap_or(url))
        .and_then(|captures| captures[1].parse().ok())
        .ok_or_else(|| Error::InvalidUrl {
            url: url.to_string(),
        })
}

fn check_status(url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        404 | 410 => Err(Error::NotFound {
            url: url.to_string(),
        }),
        429 => {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(Error::RateLimited {
                url: url.to_string(),
                retry_after,
            })
        }
        code => Err(Error::Http {
            url: url.to_string(),
            status: code,
            message: response.text().unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct TopicResponse {
    #[serde(default)]
    deleted_at: Option<String>,
    post_stream: PostStream,
}

#[derive(Debug, Deserialize)]
struct PostStream {
    posts: Vec<PostSummary>,
}

#[derive(Debug, Deserialize)]
struct PostSummary {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    topic_id: u64,
    topic_slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://forum.example/t/overview/12", 12)]
    #[case("https://forum.example/t/overview/12/", 12)]
    #[case("https://forum.example/t/overview/12/3", 12)]
    #[case("https://forum.example/t/12", 12)]
    #[case("https://forum.example/t/overview/12?u=bob", 12)]
    fn topic_ids(#[case] url: &str, #[case] id: u64) {
        assert_eq!(topic_id(url).unwrap(), id);
    }

    #[rstest]
    #[case("https://forum.example/c/docs/4")]
    #[case("https://forum.example/t/overview")]
    fn non_topic_urls(#[case] url: &str) {
        assert!(matches!(topic_id(url), Err(Error::InvalidUrl { .. })));
    }
}
