//! Temporary repository working directories with a docs tree.

use std::fs;
use std::path::{Path, PathBuf};

use docsync_fs::{CONFIG_FILE_NAME, ConfigStore, DocsLayout, SyncConfig};
use tempfile::TempDir;

/// Host written into fixture configs.
pub const TEST_HOST: &str = "https://forum.example";

/// A temporary working directory holding `docsync.toml` and `docs/`.
///
/// # Panics
/// All helpers panic on filesystem errors.
pub struct DocsFixture {
    dir: TempDir,
}

impl DocsFixture {
    /// Fixture with a minimal config and an empty `docs/` directory.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("DocsFixture: tempdir failed: {e}"));
        let fixture = Self { dir };
        fixture.write(
            CONFIG_FILE_NAME,
            &format!("# docsync configuration\n[server]\nhost = \"{TEST_HOST}\"\n"),
        );
        fs::create_dir_all(fixture.root().join("docs"))
            .unwrap_or_else(|e| panic!("DocsFixture: failed to create docs: {e}"));
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn write(&self, relative: impl AsRef<Path>, content: &str) -> &Self {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("DocsFixture: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("DocsFixture: failed to write {}: {e}", path.display()));
        self
    }

    /// Write a page under `docs/`.
    pub fn page(&self, relative: impl AsRef<Path>, content: &str) -> &Self {
        self.write(Path::new("docs").join(relative), content)
    }

    pub fn remove(&self, relative: impl AsRef<Path>) -> &Self {
        let path = self.root().join(relative);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("DocsFixture: failed to remove {}: {e}", path.display()));
        self
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        let path = self.root().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("DocsFixture: failed to read {}: {e}", path.display()))
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join(CONFIG_FILE_NAME)
    }

    pub fn config(&self) -> SyncConfig {
        ConfigStore::new()
            .load(&self.config_path())
            .unwrap_or_else(|e| panic!("DocsFixture: failed to load config: {e}"))
    }

    pub fn layout(&self) -> DocsLayout {
        DocsLayout::from_config(self.root(), CONFIG_FILE_NAME, &self.config())
            .unwrap_or_else(|e| panic!("DocsFixture: failed to build layout: {e}"))
    }
}

impl Default for DocsFixture {
    fn default() -> Self {
        Self::new()
    }
}
