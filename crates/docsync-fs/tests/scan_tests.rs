//! Scanning real documentation trees on disk

use assert_fs::TempDir;
use assert_fs::prelude::*;
use docsync_fs::{DocsLayout, Error, scan};
use pretty_assertions::assert_eq;

fn layout(dir: &TempDir) -> DocsLayout {
    DocsLayout::new(dir.path(), "docs", "docsync.toml").unwrap()
}

#[test]
fn scan_orders_pages_depth_first() {
    let dir = TempDir::new().unwrap();
    dir.child("docs/index.md").write_str("Charm docs.\n\n").unwrap();
    dir.child("docs/tutorials/overview.md")
        .write_str("# Overview\n\nStart here.\n")
        .unwrap();
    dir.child("docs/reference/actions.md").write_str("Actions list\n").unwrap();
    dir.child("docs/how-to/install.md").write_str("# Install\n").unwrap();

    let tree = scan(&layout(&dir)).unwrap();

    let paths: Vec<String> = tree.pages.iter().map(|p| p.path.to_string()).collect();
    assert_eq!(
        paths,
        vec![
            "how-to",
            "how-to/install",
            "reference",
            "reference/actions",
            "tutorials",
            "tutorials/overview",
        ]
    );
    assert_eq!(tree.index_content, "Charm docs.");

    let how_to = &tree.pages[0];
    assert!(how_to.is_group);
    assert_eq!(how_to.title, "How to");
    assert_eq!(how_to.source, None);

    let actions = &tree.pages[3];
    assert!(!actions.is_group);
    assert_eq!(actions.title, "Actions");
    assert_eq!(actions.content, "Actions list\n");
    assert_eq!(
        actions.source.as_deref(),
        Some(std::path::Path::new("docs/reference/actions.md"))
    );
}

#[test]
fn hidden_and_non_markdown_files_are_ignored() {
    let dir = TempDir::new().unwrap();
    dir.child("docs/.drafts/secret.md").write_str("x").unwrap();
    dir.child("docs/diagram.png").write_binary(&[0, 1, 2]).unwrap();
    dir.child("docs/page.md").write_str("# Page\n").unwrap();

    let tree = scan(&layout(&dir)).unwrap();

    assert_eq!(tree.pages.len(), 1);
    assert_eq!(tree.pages[0].path.to_string(), "page");
    assert_eq!(tree.index_content, "");
}

#[test]
fn nested_index_is_an_ordinary_page() {
    let dir = TempDir::new().unwrap();
    dir.child("docs/guide/index.md").write_str("# Guide home\n").unwrap();

    let tree = scan(&layout(&dir)).unwrap();

    assert_eq!(tree.pages[1].path.to_string(), "guide/index");
    assert_eq!(tree.index_content, "");
}

#[test]
fn file_and_directory_with_same_slug_collide() {
    let dir = TempDir::new().unwrap();
    dir.child("docs/guide.md").write_str("# Guide\n").unwrap();
    dir.child("docs/guide/step.md").write_str("# Step\n").unwrap();

    let err = scan(&layout(&dir)).unwrap_err();
    assert!(matches!(err, Error::DuplicatePage { ref path } if path == "guide"));
}

#[test]
fn file_names_with_spaces_are_rejected() {
    let dir = TempDir::new().unwrap();
    dir.child("docs/bad name.md").write_str("x").unwrap();

    let err = scan(&layout(&dir)).unwrap_err();
    assert!(matches!(err, Error::InvalidPage { .. }));
}

#[test]
fn missing_docs_directory() {
    let dir = TempDir::new().unwrap();
    let err = scan(&layout(&dir)).unwrap_err();
    assert!(matches!(err, Error::DocsDirMissing { .. }));
}
