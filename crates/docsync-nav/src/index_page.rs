//! Whole index page body: intro content followed by the navigation table

use crate::{NavigationTable, Result};

/// Heading that introduces the navigation table.
pub const NAVIGATION_HEADING: &str = "# Navigation";

/// Parsed index page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    /// Human-written text above the navigation heading, trailing whitespace trimmed.
    pub content: String,
    pub table: NavigationTable,
}

impl IndexPage {
    pub fn new(content: impl Into<String>, table: NavigationTable) -> Self {
        Self {
            content: content.into().trim_end().to_string(),
            table,
        }
    }

    /// Parse an index page body.
    ///
    /// The last line equal to [`NAVIGATION_HEADING`] splits the intro from the
    /// table. A body without the heading is all intro and has an empty table.
    pub fn parse(body: &str) -> Result<Self> {
        let mut heading = None;
        let mut offset = 0;
        for (line_no, line) in body.split_inclusive('\n').enumerate() {
            if line.trim_end() == NAVIGATION_HEADING {
                heading = Some((offset, offset + line.len(), line_no + 1));
            }
            offset += line.len();
        }

        match heading {
            None => {
                tracing::debug!("Index page has no navigation heading");
                Ok(Self::new(body, NavigationTable::new()))
            }
            Some((start, end, line_no)) => {
                let table = NavigationTable::parse_from(&body[end..], line_no)?;
                Ok(Self::new(&body[..start], table))
            }
        }
    }

    /// Render the page body.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let intro = self.content.trim_end();
        if !intro.is_empty() {
            out.push_str(intro);
            out.push_str("\n\n");
        }
        out.push_str(NAVIGATION_HEADING);
        out.push_str("\n\n");
        out.push_str(&self.table.render());
        out
    }
}
