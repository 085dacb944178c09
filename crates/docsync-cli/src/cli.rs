//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docsync_core::Mode;
use docsync_fs::CONFIG_FILE_NAME;

/// docsync - Keep a documentation tree and its Discourse topics in sync
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Config file, relative to the repository root
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    #[command(flatten)]
    pub credentials: Credentials,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Secrets for the content server and the pull request host.
#[derive(Args, Debug, Clone, Default)]
pub struct Credentials {
    /// Discourse user the API key belongs to
    #[arg(long, global = true, env = "DISCOURSE_API_USERNAME")]
    pub discourse_username: Option<String>,

    /// Discourse API key
    #[arg(long, global = true, env = "DISCOURSE_API_KEY", hide_env_values = true)]
    pub discourse_api_key: Option<String>,

    /// Token for pushing and for GitHub pull requests
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Reconcile the documentation tree with the content server
    ///
    /// Examples:
    ///   docsync reconcile draft            # Show what would change
    ///   docsync reconcile update --json    # Publish and print {url: outcome}
    Reconcile {
        /// What the run may do
        #[arg(value_enum)]
        mode: ModeArg,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Exit 0 when the pull request for conflicting edits is open
    CheckPullRequest,

    /// Delete topics, the base-content tag, the pull request and its branch
    Cleanup {
        /// JSON list of topic URLs, or the object printed by `reconcile --json`
        #[arg(long)]
        urls: String,
    },
}

/// Reconciliation modes accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Plan creates and updates without executing
    Draft,
    /// Create and update, never remove
    Create,
    /// Create and update, never remove
    Update,
    /// Also drop rows of removed pages, keeping their topics
    DeleteTopics,
    /// Also drop rows of removed pages and delete their topics
    Delete,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Draft => Mode::Draft,
            ModeArg::Create => Mode::Create,
            ModeArg::Update => Mode::Update,
            ModeArg::DeleteTopics => Mode::DeleteTopics,
            ModeArg::Delete => Mode::Delete,
        }
    }
}
