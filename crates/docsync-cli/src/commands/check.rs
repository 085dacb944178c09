//! Check-pull-request command implementation

use colored::Colorize;
use docsync_core::check_pull_request;

use crate::cli::Credentials;
use crate::context::Context;
use crate::error::Result;

/// Report whether the pull request for conflicting edits is open.
pub fn run_check_pull_request(context: &Context, credentials: &Credentials) -> Result<bool> {
    let repository = context.repository(credentials)?;
    let open = check_pull_request(&repository, context.options())?;

    let options = context.options();
    if open {
        println!(
            "{} pull request from {} into {} is open",
            "+".green(),
            options.feature_branch.cyan(),
            options.base_branch.cyan()
        );
    } else {
        println!(
            "{} no open pull request from {} into {}",
            "-".red(),
            options.feature_branch.cyan(),
            options.base_branch.cyan()
        );
    }
    Ok(open)
}
