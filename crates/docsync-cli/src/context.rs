//! Clients and settings assembled from the config file and credentials

use std::path::{Path, PathBuf};

use docsync_core::{Session, SyncOptions};
use docsync_fs::{ConfigStore, DocsLayout, SyncConfig};
use docsync_git::{GitRepository, GithubHost, RepositoryClient};
use docsync_server::{ContentServer, DiscourseClient, DiscourseConfig};

use crate::cli::Credentials;
use crate::error::{CliError, Result};

/// Loaded configuration for one repository.
#[derive(Debug, Clone)]
pub struct Context {
    config: SyncConfig,
    layout: DocsLayout,
    options: SyncOptions,
}

impl Context {
    /// Load `config_file` (relative to `root`).
    pub fn load(root: &Path, config_file: &Path) -> Result<Self> {
        let config_path = root.join(config_file);
        if !config_path.exists() {
            return Err(CliError::user(format!(
                "No docsync config at {}",
                config_path.display()
            )));
        }

        let config: SyncConfig = ConfigStore::new().load(&config_path)?;
        let layout = DocsLayout::from_config(root, PathBuf::from(config_file), &config)?;
        let options = SyncOptions::from_config(&config);
        tracing::debug!(root = %layout.root().display(), host = %config.server.host, "Loaded config");

        Ok(Self {
            config,
            layout,
            options,
        })
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Repository client for the root, with a GitHub host when configured.
    pub fn repository(&self, credentials: &Credentials) -> Result<GitRepository> {
        let section = &self.config.repository;
        let mut repository = GitRepository::open(self.layout.root(), section.remote.clone())?;
        if let Some(token) = &credentials.github_token {
            repository = repository.with_token(token.clone());
        }

        if let Some(name) = &section.github_repository {
            let token = credentials.github_token.clone().ok_or_else(|| {
                CliError::user("GITHUB_TOKEN is required when repository.github_repository is set")
            })?;
            repository = repository.with_host(GithubHost::new(name.clone(), token)?);
        }
        Ok(repository)
    }

    /// Discourse client for the configured host.
    pub fn server(&self, credentials: &Credentials) -> Result<DiscourseClient> {
        let username = credentials
            .discourse_username
            .clone()
            .ok_or_else(|| CliError::user("DISCOURSE_API_USERNAME is not set"))?;
        let api_key = credentials
            .discourse_api_key
            .clone()
            .ok_or_else(|| CliError::user("DISCOURSE_API_KEY is not set"))?;

        let server = &self.config.server;
        let config = DiscourseConfig::new(server.host.clone(), username, api_key)
            .with_category(server.category_id);
        Ok(DiscourseClient::new(config)?)
    }

    pub fn session<'a>(
        &self,
        repository: &'a mut dyn RepositoryClient,
        server: &'a mut dyn ContentServer,
    ) -> Session<'a> {
        Session::new(
            repository,
            server,
            self.layout.clone(),
            self.options.clone(),
            self.config.server.index_url.clone(),
        )
    }
}
