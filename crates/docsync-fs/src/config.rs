//! Project configuration and format-agnostic config storage

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Error, Result, io};

/// Default name of the project configuration file.
pub const CONFIG_FILE_NAME: &str = "docsync.toml";

/// Contents of `docsync.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub docs: DocsSection,
    pub server: ServerSection,
    #[serde(default)]
    pub repository: RepositorySection,
}

/// `[docs]`: where the local documentation tree lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocsSection {
    /// Documentation directory, relative to the repository root.
    #[serde(default = "default_docs_directory")]
    pub directory: PathBuf,
    /// Title used when the index topic is first created.
    #[serde(default = "default_index_title")]
    pub index_title: String,
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            directory: default_docs_directory(),
            index_title: default_index_title(),
        }
    }
}

/// `[server]`: the content server hosting the topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Base URL, e.g. `https://discourse.example.com`.
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// URL of the index topic; written back after the first run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_url: Option<String>,
}

/// `[repository]`: branch and pull-request host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySection {
    #[serde(default = "default_base_branch")]
    pub base_branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    /// `owner/name` on the pull-request host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_repository: Option<String>,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            base_branch: default_base_branch(),
            remote: default_remote(),
            github_repository: None,
        }
    }
}

fn default_docs_directory() -> PathBuf {
    PathBuf::from("docs")
}

fn default_index_title() -> String {
    "Documentation".to_string()
}

fn default_base_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

/// Format-agnostic configuration store.
///
/// Format is detected from the file extension:
/// - `.toml` -> TOML
/// - `.json` -> JSON
/// - `.yaml`, `.yml` -> YAML
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = io::read_text(path)?;

        match Format::of(path)? {
            Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, "TOML", e)),
            Format::Json => {
                serde_json::from_str(&content).map_err(|e| parse_error(path, "JSON", e))
            }
            Format::Yaml => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(path, "YAML", e))
            }
        }
    }

    /// Save configuration to a file atomically.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let content = match Format::of(path)? {
            Format::Toml => {
                toml::to_string_pretty(value).map_err(|e| serialize_error(path, "TOML", e))?
            }
            Format::Json => serde_json::to_string_pretty(value)
                .map_err(|e| serialize_error(path, "JSON", e))?,
            Format::Yaml => {
                serde_yaml::to_string(value).map_err(|e| serialize_error(path, "YAML", e))?
            }
        };

        io::write_text(path, &content)
    }

    /// Set a single string value inside a table of an existing file.
    ///
    /// TOML files are edited in place so comments, ordering and formatting of
    /// everything else survive. Other formats are rewritten.
    pub fn set_value(&self, path: &Path, table: &str, key: &str, value: &str) -> Result<()> {
        let content = io::read_text(path)?;

        let updated = match Format::of(path)? {
            Format::Toml => {
                let mut doc: toml_edit::DocumentMut = content
                    .parse()
                    .map_err(|e: toml_edit::TomlError| parse_error(path, "TOML", e))?;
                if !doc.get(table).is_some_and(|item| item.is_table_like()) {
                    doc[table] = toml_edit::table();
                }
                doc[table][key] = toml_edit::value(value);
                doc.to_string()
            }
            Format::Json => {
                let mut doc: serde_json::Value =
                    serde_json::from_str(&content).map_err(|e| parse_error(path, "JSON", e))?;
                let section = doc
                    .as_object_mut()
                    .ok_or_else(|| not_a_table(path, "JSON"))?
                    .entry(table)
                    .or_insert_with(|| serde_json::Value::Object(Default::default()));
                section
                    .as_object_mut()
                    .ok_or_else(|| not_a_table(path, "JSON"))?
                    .insert(key.to_string(), serde_json::Value::from(value));
                serde_json::to_string_pretty(&doc).map_err(|e| serialize_error(path, "JSON", e))?
            }
            Format::Yaml => {
                let mut doc: serde_yaml::Value =
                    serde_yaml::from_str(&content).map_err(|e| parse_error(path, "YAML", e))?;
                let section = doc
                    .as_mapping_mut()
                    .ok_or_else(|| not_a_table(path, "YAML"))?
                    .entry(table.into())
                    .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));
                section
                    .as_mapping_mut()
                    .ok_or_else(|| not_a_table(path, "YAML"))?
                    .insert(key.into(), value.into());
                serde_yaml::to_string(&doc).map_err(|e| serialize_error(path, "YAML", e))?
            }
        };

        tracing::debug!(path = %path.display(), table, key, "Updated config value");
        io::write_text(path, &updated)
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat { extension }),
        }
    }
}

fn parse_error(path: &Path, format: &str, error: impl std::fmt::Display) -> Error {
    Error::ConfigParse {
        path: path.to_path_buf(),
        format: format.into(),
        message: error.to_string(),
    }
}

fn serialize_error(path: &Path, format: &str, error: impl std::fmt::Display) -> Error {
    Error::ConfigSerialize {
        path: path.to_path_buf(),
        format: format.into(),
        message: error.to_string(),
    }
}

fn not_a_table(path: &Path, format: &str) -> Error {
    parse_error(path, format, "expected a table at the document root")
}
