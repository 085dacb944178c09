//! Repository layout

use std::path::{Path, PathBuf};

use crate::{Error, Result, SyncConfig};

/// Locations of the documentation tree and config file inside a repository.
///
/// Relative paths are what gets committed; absolute paths are what gets read
/// and written on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsLayout {
    root: PathBuf,
    docs_dir: PathBuf,
    config_file: PathBuf,
}

impl DocsLayout {
    /// Create a layout rooted at `root`.
    ///
    /// `docs_dir` and `config_file` are relative to the root.
    pub fn new(
        root: impl AsRef<Path>,
        docs_dir: impl Into<PathBuf>,
        config_file: impl Into<PathBuf>,
    ) -> Result<Self> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).map_err(|e| Error::io(root, e))?;
        Ok(Self {
            root,
            docs_dir: docs_dir.into(),
            config_file: config_file.into(),
        })
    }

    /// Layout described by a loaded config file.
    pub fn from_config(
        root: impl AsRef<Path>,
        config_file: impl Into<PathBuf>,
        config: &SyncConfig,
    ) -> Result<Self> {
        Self::new(root, config.docs.directory.clone(), config_file)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Documentation directory relative to the root.
    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Config file relative to the root.
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn docs_path(&self) -> PathBuf {
        self.root.join(&self.docs_dir)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file)
    }

    /// Absolute path of a file given relative to the root.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Index page file relative to the root.
    pub fn index_file(&self) -> PathBuf {
        self.docs_dir.join(crate::INDEX_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_joined_onto_canonical_root() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DocsLayout::new(dir.path(), "docs", "docsync.toml").unwrap();

        let root = dunce::canonicalize(dir.path()).unwrap();
        assert_eq!(layout.root(), root.as_path());
        assert_eq!(layout.docs_path(), root.join("docs"));
        assert_eq!(layout.config_path(), root.join("docsync.toml"));
        assert_eq!(layout.index_file(), PathBuf::from("docs/index.md"));
    }

    #[test]
    fn missing_root_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DocsLayout::new(dir.path().join("missing"), "docs", "docsync.toml");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
