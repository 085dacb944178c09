//! GitHub pull-request host

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{Error, PullRequest, PullRequestHost, PullRequestState, Result};

/// Public GitHub REST endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pull requests of one GitHub repository, accessed with a token.
#[derive(Debug, Clone)]
pub struct GithubHost {
    client: Client,
    api_url: String,
    repository: String,
    token: String,
}

impl GithubHost {
    /// `repository` is `owner/name`.
    pub fn new(repository: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_api_url(GITHUB_API_URL, repository, token)
    }

    pub fn with_api_url(
        api_url: impl Into<String>,
        repository: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("docsync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(Error::host)?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repository: repository.into(),
            token: token.into(),
        })
    }

    fn owner(&self) -> &str {
        self.repository
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or(&self.repository)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(
                method,
                format!("{}/repos/{}{}", self.api_url, self.repository, path),
            )
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().map_err(Error::host)?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(Error::HostResponse {
                status: status.as_u16(),
                message,
            });
        }
        response.json().map_err(Error::host)
    }
}

impl PullRequestHost for GithubHost {
    fn list(&self, head: &str) -> Result<Vec<PullRequest>> {
        let head_filter = format!("{}:{}", self.owner(), head);
        let request = self.request(Method::GET, "/pulls").query(&[
            ("head", head_filter.as_str()),
            ("state", "all"),
            ("sort", "created"),
            ("direction", "desc"),
        ]);
        let pulls: Vec<ApiPullRequest> = self.send(request)?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }

    fn open(&self, head: &str, base: &str, title: &str, body: &str) -> Result<PullRequest> {
        let request = self.request(Method::POST, "/pulls").json(&serde_json::json!({
            "title": title,
            "head": head,
            "base": base,
            "body": body,
        }));
        let pull: ApiPullRequest = self.send(request)?;
        Ok(pull.into())
    }

    fn set_state(&self, number: u64, state: PullRequestState) -> Result<()> {
        let request = self
            .request(Method::PATCH, &format!("/pulls/{}", number))
            .json(&serde_json::json!({ "state": state }));
        let _: serde_json::Value = self.send(request)?;
        tracing::debug!(number, ?state, "Changed pull request state");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    state: PullRequestState,
    html_url: Option<String>,
    merged_at: Option<DateTime<Utc>>,
    head: ApiRef,
    base: ApiRef,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    name: String,
}

impl From<ApiPullRequest> for PullRequest {
    fn from(pull: ApiPullRequest) -> Self {
        Self {
            number: pull.number,
            head: pull.head.name,
            base: pull.base.name,
            state: pull.state,
            merged: pull.merged_at.is_some(),
            url: pull.html_url,
        }
    }
}
