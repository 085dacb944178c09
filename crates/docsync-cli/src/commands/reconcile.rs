//! Reconcile command implementation

use colored::Colorize;
use docsync_core::{Mode, Outcome, RunReport, reconcile};

use crate::cli::Credentials;
use crate::context::Context;
use crate::error::Result;

/// Run one reconciliation. Returns false when any page failed.
pub fn run_reconcile(context: &Context, credentials: &Credentials, mode: Mode, json: bool) -> Result<bool> {
    let mut repository = context.repository(credentials)?;
    let mut server = context.server(credentials)?;
    let mut session = context.session(&mut repository, &mut server);

    let report = reconcile(&mut session, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.urls_with_actions())?);
    } else {
        print_report(&report);
    }
    Ok(!report.has_failures())
}

fn print_report(report: &RunReport) {
    println!(
        "{} {} ({})",
        "Reconciled".bold(),
        report.mode.to_string().cyan(),
        report.state
    );
    println!();

    if report.outcomes.is_empty() {
        println!("  {}", "Nothing to do".dimmed());
    }
    for (path, outcome) in &report.outcomes {
        let label = match outcome {
            Outcome::Failed { .. } | Outcome::Skipped { .. } => outcome.label().red(),
            Outcome::Conflict { .. } => outcome.label().yellow(),
            _ => outcome.label().green(),
        };
        println!("  {:<10} {} {}", label, path, outcome.to_string().dimmed());
    }
    println!();

    if let Some(url) = &report.index_url {
        let state = if report.index_changed { "updated" } else { "unchanged" };
        println!("{}:  {} ({})", "Index".dimmed(), url, state);
    }
    if let Some(commit) = &report.commit {
        println!("{}: {}", "Commit".dimmed(), commit);
    }
    if let Some(pr) = &report.pull_request {
        let url = pr.url.as_deref().unwrap_or_default();
        println!("{}:     #{} {}", "PR".dimmed(), pr.number, url);
    }
    if report.conflicts() > 0 {
        println!();
        println!(
            "{} {} conflicting edit(s) await review",
            "!".yellow().bold(),
            report.conflicts()
        );
    }
}
