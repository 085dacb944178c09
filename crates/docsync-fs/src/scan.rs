//! Document tree scanner
//!
//! Walks the documentation directory and produces the target page set in
//! depth-first order. Directories become group pages, `.md` files become
//! content pages keyed by their file stem. The top-level `index.md` holds the
//! intro content of the index page and is not a page itself.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use docsync_nav::{Page, PagePath};
use walkdir::{DirEntry, WalkDir};

use crate::{DocsLayout, Error, Result, io};

/// File holding the index page intro.
pub const INDEX_FILE_NAME: &str = "index.md";

const PAGE_EXTENSION: &str = "md";

/// Local side of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTree {
    /// Pages in depth-first order; parents precede their children.
    pub pages: Vec<Page>,
    /// Intro content of the index page, trailing whitespace trimmed.
    pub index_content: String,
}

impl DocumentTree {
    pub fn get(&self, path: &PagePath) -> Option<&Page> {
        self.pages.iter().find(|p| &p.path == path)
    }
}

/// Scan the documentation directory of `layout`.
pub fn scan(layout: &DocsLayout) -> Result<DocumentTree> {
    let docs_path = layout.docs_path();
    if !docs_path.is_dir() {
        return Err(Error::DocsDirMissing { path: docs_path });
    }

    let mut tree = DocumentTree::default();
    let mut seen = HashSet::new();

    let walker = WalkDir::new(&docs_path)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(&docs_path)
            .map_err(|_| invalid(entry.path(), "outside the documentation directory"))?
            .to_path_buf();
        let source = layout.docs_dir().join(&relative);

        if entry.depth() == 1 && entry.file_type().is_file() && relative == Path::new(INDEX_FILE_NAME)
        {
            tree.index_content = io::read_text(entry.path())?.trim_end().to_string();
            continue;
        }

        let page = if entry.file_type().is_dir() {
            let path = page_path(&relative, false)?;
            let title = title_from_slug(path.slug());
            Page::group(path, title)
        } else if entry.file_type().is_file() && is_page_file(entry.path()) {
            let path = page_path(&relative, true)?;
            let content = io::read_text(entry.path())?;
            let title = title_from_content(&content).unwrap_or_else(|| title_from_slug(path.slug()));
            Page::document(path, title, content, source)
        } else {
            tracing::debug!(path = %source.display(), "Skipping non-page file");
            continue;
        };

        if !seen.insert(page.path.clone()) {
            return Err(Error::DuplicatePage {
                path: page.path.to_string(),
            });
        }
        tree.pages.push(page);
    }

    tracing::debug!(pages = tree.pages.len(), "Scanned documentation tree");
    Ok(tree)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn is_page_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PAGE_EXTENSION)
}

fn page_path(relative: &Path, strip_extension: bool) -> Result<PagePath> {
    let stripped;
    let relative = if strip_extension {
        stripped = relative.with_extension("");
        stripped.as_path()
    } else {
        relative
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        let Component::Normal(name) = component else {
            return Err(invalid(relative, "unexpected path component"));
        };
        let name = name
            .to_str()
            .ok_or_else(|| invalid(relative, "file name is not valid UTF-8"))?;
        segments.push(name.to_string());
    }

    PagePath::new(segments).map_err(|e| invalid(relative, e))
}

/// Title from the first level-one heading of a page.
fn title_from_content(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Title derived from a slug: `how-to` becomes `How to`.
fn title_from_slug(slug: &str) -> String {
    let words = slug.replace(['-', '_'], " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn invalid(path: impl Into<PathBuf>, message: impl ToString) -> Error {
    Error::InvalidPage {
        path: path.into(),
        message: message.to_string(),
    }
}
