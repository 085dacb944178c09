//! In-memory backup of the documentation tree
//!
//! Branch switches rewrite tracked files; a backup taken beforehand puts the
//! working tree back exactly as it was, including uncommitted edits, new
//! pages and deletions.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::{DocsLayout, Error, Result, io};

/// Contents of every file under the documentation directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocsBackup {
    /// File contents keyed by path relative to the repository root
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl DocsBackup {
    /// Read every file under the documentation directory.
    pub fn capture(layout: &DocsLayout) -> Result<Self> {
        let files = read_files(layout)?
            .into_iter()
            .map(|relative| {
                let absolute = layout.resolve(&relative);
                let content = fs::read(&absolute).map_err(|e| Error::io(&absolute, e))?;
                Ok((relative, content))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        tracing::debug!(files = files.len(), "Captured documentation backup");
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Put the documentation directory back to the captured state.
    ///
    /// Files created since the capture are removed. Returns the restored paths.
    pub fn restore(&self, layout: &DocsLayout) -> Result<Vec<PathBuf>> {
        for relative in read_files(layout)? {
            if !self.files.contains_key(&relative) {
                let absolute = layout.resolve(&relative);
                fs::remove_file(&absolute).map_err(|e| Error::io(&absolute, e))?;
                tracing::debug!(path = %relative.display(), "Removed file absent from backup");
            }
        }

        let mut restored = Vec::with_capacity(self.files.len());
        for (relative, content) in &self.files {
            io::write_atomic(&layout.resolve(relative), content)?;
            restored.push(relative.clone());
        }
        Ok(restored)
    }
}

/// Files under the documentation directory, relative to the repository root.
fn read_files(layout: &DocsLayout) -> Result<Vec<PathBuf>> {
    let docs_path = layout.docs_path();
    if !docs_path.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&docs_path).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(layout.root()) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CONFIG_FILE_NAME;
    use tempfile::TempDir;

    fn layout(dir: &TempDir) -> DocsLayout {
        fs::create_dir_all(dir.path().join("docs/guide")).unwrap();
        DocsLayout::new(dir.path(), "docs", CONFIG_FILE_NAME).unwrap()
    }

    #[test]
    fn restore_reverts_edits_additions_and_deletions() {
        let dir = TempDir::new().unwrap();
        let layout = layout(&dir);
        let docs = dir.path().join("docs");
        fs::write(docs.join("index.md"), "Intro\n").unwrap();
        fs::write(docs.join("guide/setup.md"), "# Setup\n").unwrap();

        let backup = DocsBackup::capture(&layout).unwrap();
        assert_eq!(backup.len(), 2);

        fs::write(docs.join("guide/setup.md"), "# Changed\n").unwrap();
        fs::remove_file(docs.join("index.md")).unwrap();
        fs::write(docs.join("stray.md"), "stray").unwrap();

        let restored = backup.restore(&layout).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(fs::read_to_string(docs.join("guide/setup.md")).unwrap(), "# Setup\n");
        assert_eq!(fs::read_to_string(docs.join("index.md")).unwrap(), "Intro\n");
        assert!(!docs.join("stray.md").exists());
    }
}
