//! Cleanup command implementation

use colored::Colorize;
use docsync_core::cleanup;
use serde_json::Value;

use crate::cli::Credentials;
use crate::context::Context;
use crate::error::{CliError, Result};

/// Remove what previous runs published. Returns false when any step failed.
pub fn run_cleanup(context: &Context, credentials: &Credentials, urls: &str) -> Result<bool> {
    let urls = parse_urls(urls)?;
    let mut repository = context.repository(credentials)?;
    let mut server = context.server(credentials)?;

    let ok = cleanup(&mut repository, &mut server, context.options(), &urls);

    if ok {
        println!("{} cleaned up {} topic(s)", "+".green(), urls.len());
    } else {
        println!("{} cleanup finished with failures", "-".red());
    }
    Ok(ok)
}

/// Accept a JSON list of URLs or a `{url: outcome}` object.
fn parse_urls(input: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(input)?;
    let invalid = || CliError::user("--urls must be a JSON list of URLs or an object keyed by URL");

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(url) => Ok(url),
                _ => Err(invalid()),
            })
            .collect(),
        Value::Object(map) => Ok(map.into_iter().map(|(url, _)| url).collect()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        let urls = parse_urls(r#"["https://f/t/a/1", "https://f/t/b/2"]"#).unwrap();
        assert_eq!(urls, vec!["https://f/t/a/1", "https://f/t/b/2"]);
    }

    #[test]
    fn test_parse_reconcile_output() {
        let urls = parse_urls(r#"{"https://f/t/a/1": "created", "https://f/t/docs/3": "index"}"#).unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"https://f/t/docs/3".to_string()));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert!(matches!(parse_urls("[1, 2]"), Err(CliError::User { .. })));
        assert!(matches!(parse_urls("\"url\""), Err(CliError::User { .. })));
        assert!(matches!(parse_urls("not json"), Err(CliError::Json(_))));
    }
}
