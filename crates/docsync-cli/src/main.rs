//! docsync CLI
//!
//! Reconciles a repository's documentation tree with Discourse topics.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Run the selected command; `Ok(false)` exits with status 1 without an
/// error message.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            eprintln!("{}: tracing subscriber already set", "warning".yellow().bold());
        }
        tracing::debug!("Verbose mode enabled");
    }

    let context = Context::load(&cli.root, &cli.config)?;

    match cli.command {
        Commands::Reconcile { mode, json } => {
            commands::run_reconcile(&context, &cli.credentials, mode.into(), json)
        }
        Commands::CheckPullRequest => commands::run_check_pull_request(&context, &cli.credentials),
        Commands::Cleanup { urls } => commands::run_cleanup(&context, &cli.credentials, &urls),
    }
}
