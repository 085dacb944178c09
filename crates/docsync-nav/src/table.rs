//! Flat navigation table with index-based parent references
//!
//! Markup written under the `# Navigation` heading of the index page:
//!
//! ```text
//! | Level | Path | Navlink |
//! | -- | -- | -- |
//! | 1 | tutorials | [Tutorials]() |
//! | 2 | t-overview | [Overview](https://forum.example/t/overview/12) |
//! ```
//!
//! `Level` is the depth starting at 1 and may grow by at most one per row.
//! `Path` holds only the last slug; the full path comes from the enclosing
//! rows. An empty link marks a group row. `|` inside titles is written `\|`.
//! Titles are single line: line breaks are folded to spaces when a row is
//! added or updated, so rendering and re-parsing returns the same table.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, PagePath, Result, validate_slug};

/// Header line written above the rows.
pub const TABLE_HEADER: &str = "| Level | Path | Navlink |";

/// Separator line between the header and the rows.
pub const TABLE_SEPARATOR: &str = "| -- | -- | -- |";

const HEADER_CELLS: [&str; 3] = ["level", "path", "navlink"];

/// `[title](link)` with `\`-escaped characters allowed in the title.
static NAVLINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[((?:\\.|[^\]\\])*)\]\(([^()\s]*)\)$").expect("Invalid navlink regex")
});

static SEPARATOR_CELL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-+:?$").expect("Invalid separator regex"));

/// One row of the navigation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRow {
    /// Full path, reconstructed from the depth stack while parsing.
    pub path: PagePath,
    pub title: String,
    /// Remote topic URL; `None` for group rows.
    pub link: Option<String>,
    /// Table index of the parent row.
    pub parent: Option<usize>,
}

impl NavigationRow {
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn slug(&self) -> &str {
        self.path.slug()
    }

    pub fn is_group(&self) -> bool {
        self.link.is_none()
    }
}

/// Ordered rows; every row's parent appears before it and a row's
/// descendants follow it contiguously.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationTable {
    rows: Vec<NavigationRow>,
}

impl NavigationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[NavigationRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NavigationRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the row at `path`.
    pub fn position(&self, path: &PagePath) -> Option<usize> {
        self.rows.iter().position(|row| &row.path == path)
    }

    pub fn get(&self, path: &PagePath) -> Option<&NavigationRow> {
        self.rows.iter().find(|row| &row.path == path)
    }

    /// The parent row of the row at `index`.
    pub fn parent_of(&self, index: usize) -> Option<&NavigationRow> {
        self.rows.get(index)?.parent.and_then(|p| self.rows.get(p))
    }

    /// Append a row at the end of the table.
    ///
    /// The row's parent must already be present.
    pub fn push(&mut self, path: PagePath, title: impl Into<String>, link: Option<String>) -> Result<usize> {
        self.check_insertable(&path)?;
        let parent = path.parent().and_then(|p| self.position(&p));
        self.rows.push(NavigationRow {
            path,
            title: single_line(title.into()),
            link,
            parent,
        });
        Ok(self.rows.len() - 1)
    }

    /// Insert a row after the last descendant of its parent.
    ///
    /// Top-level rows are appended at the end. Returns the row's index.
    pub fn insert(&mut self, path: PagePath, title: impl Into<String>, link: Option<String>) -> Result<usize> {
        self.check_insertable(&path)?;
        let index = match path.parent() {
            None => self.rows.len(),
            Some(parent) => {
                let parent_index = self.position(&parent).ok_or_else(|| Error::MissingParent {
                    path: path.to_string(),
                })?;
                self.subtree_end(parent_index)
            }
        };

        self.rows.insert(
            index,
            NavigationRow {
                path,
                title: single_line(title.into()),
                link,
                parent: None,
            },
        );
        self.reindex();
        Ok(index)
    }

    /// Change the title and link of an existing row.
    ///
    /// Returns false when no row exists at `path`.
    pub fn update(&mut self, path: &PagePath, title: impl Into<String>, link: Option<String>) -> bool {
        match self.rows.iter_mut().find(|row| &row.path == path) {
            Some(row) => {
                row.title = single_line(title.into());
                row.link = link;
                true
            }
            None => false,
        }
    }

    /// Remove the row at `path` together with any rows nested under it.
    pub fn remove(&mut self, path: &PagePath) -> Option<NavigationRow> {
        let index = self.position(path)?;
        let end = self.subtree_end(index);
        let mut removed: Vec<NavigationRow> = self.rows.drain(index..end).collect();
        self.reindex();
        if removed.len() > 1 {
            tracing::debug!(path = %path, nested = removed.len() - 1, "Removed nested rows");
        }
        Some(removed.swap_remove(0))
    }

    /// One past the index of the last descendant of the row at `index`.
    pub fn subtree_end(&self, index: usize) -> usize {
        let depth = self.rows[index].depth();
        self.rows[index + 1..]
            .iter()
            .position(|row| row.depth() <= depth)
            .map(|offset| index + 1 + offset)
            .unwrap_or(self.rows.len())
    }

    fn check_insertable(&self, path: &PagePath) -> Result<()> {
        if self.position(path).is_some() {
            return Err(Error::DuplicatePath {
                path: path.to_string(),
            });
        }
        if let Some(parent) = path.parent()
            && self.position(&parent).is_none()
        {
            return Err(Error::MissingParent {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn reindex(&mut self) {
        let mut positions: HashMap<PagePath, usize> = HashMap::with_capacity(self.rows.len());
        for index in 0..self.rows.len() {
            let parent = self.rows[index]
                .path
                .parent()
                .and_then(|p| positions.get(&p).copied());
            self.rows[index].parent = parent;
            positions.insert(self.rows[index].path.clone(), index);
        }
    }

    /// Parse a table (header, separator and rows).
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_from(text, 0)
    }

    /// Parse a table whose first line is line `first_line + 1` of the page.
    pub(crate) fn parse_from(text: &str, first_line: usize) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (first_line + i + 1, line))
            .skip_while(|(_, line)| line.trim().is_empty());

        let (_, header) = lines.next().ok_or(Error::MissingHeader)?;
        let header_ok = split_cells(header).is_some_and(|cells| {
            cells.len() == HEADER_CELLS.len()
                && cells
                    .iter()
                    .zip(HEADER_CELLS)
                    .all(|(cell, expected)| cell.eq_ignore_ascii_case(expected))
        });
        if !header_ok {
            return Err(Error::MissingHeader);
        }

        let (_, separator) = lines.next().ok_or(Error::MissingHeader)?;
        let separator_ok = split_cells(separator).is_some_and(|cells| {
            cells.len() == HEADER_CELLS.len()
                && cells.iter().all(|cell| SEPARATOR_CELL_REGEX.is_match(cell))
        });
        if !separator_ok {
            return Err(Error::MissingHeader);
        }

        let mut table = Self::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut seen: HashSet<PagePath> = HashSet::new();

        while let Some((line_no, line)) = lines.next() {
            if line.trim().is_empty() {
                if let Some((line, _)) = lines.find(|(_, l)| !l.trim().is_empty()) {
                    return Err(Error::TrailingContent { line });
                }
                break;
            }

            let cells = split_cells(line).ok_or(Error::TrailingContent { line: line_no })?;
            if cells.len() != HEADER_CELLS.len() {
                return Err(Error::malformed(
                    line_no,
                    format!("expected 3 cells, found {}", cells.len()),
                ));
            }

            let depth: usize = cells[0]
                .parse()
                .map_err(|_| Error::malformed(line_no, "level is not a number"))?;
            let max = stack.len() + 1;
            if depth == 0 || depth > max {
                return Err(Error::InvalidNesting {
                    line: line_no,
                    depth,
                    max,
                });
            }

            let slug = cells[1].as_str();
            validate_slug(slug).map_err(|e| Error::malformed(line_no, e.to_string()))?;

            let (title, link) = parse_navlink(&cells[2])
                .ok_or_else(|| Error::malformed(line_no, "navlink is not [title](link)"))?;

            stack.truncate(depth - 1);
            let parent = stack.last().copied();
            let path = match parent {
                Some(p) => table.rows[p].path.child(slug)?,
                None => PagePath::root(slug)?,
            };
            if !seen.insert(path.clone()) {
                return Err(Error::DuplicatePath {
                    path: path.to_string(),
                });
            }

            table.rows.push(NavigationRow {
                path,
                title,
                link,
                parent,
            });
            stack.push(table.rows.len() - 1);
        }

        Ok(table)
    }

    /// Render the header, separator and one line per row.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(TABLE_HEADER);
        out.push('\n');
        out.push_str(TABLE_SEPARATOR);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format!(
                "| {} | {} | [{}]({}) |\n",
                row.depth(),
                row.slug(),
                escape_title(&row.title),
                row.link.as_deref().unwrap_or("")
            ));
        }
        out
    }
}

impl<'a> IntoIterator for &'a NavigationTable {
    type Item = &'a NavigationRow;
    type IntoIter = std::slice::Iter<'a, NavigationRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Split `| a | b | c |` into trimmed cells, honouring `\|` escapes.
fn split_cells(line: &str) -> Option<Vec<String>> {
    let inner = line.trim().strip_prefix('|')?.strip_suffix('|')?;

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    Some(cells)
}

fn parse_navlink(cell: &str) -> Option<(String, Option<String>)> {
    let caps = NAVLINK_REGEX.captures(cell)?;
    let title = unescape_title(caps.get(1)?.as_str());
    let link = caps.get(2).map(|m| m.as_str()).filter(|l| !l.is_empty());
    Some((title, link.map(str::to_string)))
}

/// Fold line breaks into spaces; a row occupies one line of markup.
fn single_line(title: String) -> String {
    if title.contains(['\n', '\r']) {
        title.replace("\r\n", " ").replace(['\n', '\r'], " ")
    } else {
        title
    }
}

fn escape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        match c {
            '\\' | '|' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_title(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn path(s: &str) -> PagePath {
        s.parse().unwrap()
    }

    #[test]
    fn split_cells_keeps_escaped_pipes() {
        let cells = split_cells(r"| 1 | a | [x \| y]() |").unwrap();
        assert_eq!(cells, vec!["1", "a", r"[x \| y]()"]);
    }

    #[test]
    fn multi_line_titles_are_folded_and_round_trip() {
        let mut table = NavigationTable::new();
        table
            .push(path("deploy"), "Deploy\nand\r\nscale", Some("https://f/t/deploy/4".into()))
            .unwrap();
        table.push(path("group"), "Group", None).unwrap();
        assert!(table.update(&path("group"), "Grouped\rpages", None));

        assert_eq!(table.rows()[0].title, "Deploy and scale");
        assert_eq!(table.rows()[1].title, "Grouped pages");
        let reparsed = NavigationTable::parse(&table.render()).unwrap();
        assert_eq!(reparsed, table);
    }

    #[test]
    fn title_escaping_round_trips() {
        let title = r"a|b]c\d";
        assert_eq!(unescape_title(&escape_title(title)), title);
    }

    #[test]
    fn insert_places_child_after_parent_subtree() {
        let mut table = NavigationTable::new();
        table.push(path("tutorials"), "Tutorials", None).unwrap();
        table.push(path("tutorials/first"), "First", Some("u1".into())).unwrap();
        table.push(path("reference"), "Reference", None).unwrap();

        let index = table
            .insert(path("tutorials/second"), "Second", Some("u2".into()))
            .unwrap();

        assert_eq!(index, 2);
        assert_eq!(table.rows()[3].path, path("reference"));
        assert_eq!(table.rows()[2].parent, Some(0));
        assert_eq!(table.parent_of(2).unwrap().title, "Tutorials");
    }

    #[test]
    fn insert_without_parent_fails() {
        let mut table = NavigationTable::new();
        let err = table.insert(path("missing/child"), "Child", None).unwrap_err();
        assert!(matches!(err, Error::MissingParent { .. }));
    }

    #[test]
    fn remove_drops_nested_rows_and_reindexes() {
        let mut table = NavigationTable::new();
        table.push(path("a"), "A", None).unwrap();
        table.push(path("a/b"), "B", Some("u".into())).unwrap();
        table.push(path("c"), "C", None).unwrap();
        table.push(path("c/d"), "D", Some("v".into())).unwrap();

        let removed = table.remove(&path("a")).unwrap();

        assert_eq!(removed.path, path("a"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].parent, Some(0));
    }
}
