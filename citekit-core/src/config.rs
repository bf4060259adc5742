//! Configuration for citekit

use crate::citekey::{CitekeyFormat, DEFAULT_CITEKEY_PATTERN};
use crate::error::CitekitError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# Citekit Configuration

[citekey]
# Citekey format as a case-sensitive regular expression. Capture groups are
# the parts used to build web search queries (author, year, title word).
pattern = '\b(?P<author>[a-z][a-z-]*)(?P<year>[0-9]{4})(?P<word>[a-z0-9]+)\b'
# Heading property that binds a citekey when the heading title is not one
property = "CUSTOM_ID"

[directories]
# Uncomment and point these at your note collection
# notes = "~/notes"
# content = "~/notes/files"
# stage = "~/notes/stage"
# bib = "~/notes/bib"

[files]
# Characters that may separate a citekey from the rest of a file name
separators = "-_"
# Suffix proposed when the canonical citekey name is already taken
secondary_suffix = "-supplement"
# File extension of note documents in the notes directory
note_extension = "org"

[search]
# Web search URL; %s is replaced by the joined citekey groups
url = "https://scholar.google.com/scholar?q=%s"
# Capture groups (1-based, in order) joined into the query
groups = [1, 2, 3]
# Delimiter between joined groups
delimiter = "+"

[index]
# Memoize citekey scans across calls (stale after edits until cleared)
use_cache = true
"#;

/// Citekit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub citekey: CitekeyConfig,
    #[serde(default)]
    pub directories: DirectoriesConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitekeyConfig {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default = "default_property")]
    pub property: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoriesConfig {
    /// Note documents
    pub notes: Option<std::path::PathBuf>,
    /// Study files (PDFs etc.) named after citekeys
    pub content: Option<std::path::PathBuf>,
    /// New files awaiting rename into the content directory
    pub stage: Option<std::path::PathBuf>,
    /// Bibliographic entries, one file per citekey
    pub bib: Option<std::path::PathBuf>,
    /// Single bibliographic file, alternative to `bib`
    pub bib_file: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_separators")]
    pub separators: String,
    #[serde(default = "default_secondary_suffix")]
    pub secondary_suffix: String,
    #[serde(default = "default_note_extension")]
    pub note_extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_url")]
    pub url: String,
    #[serde(default = "default_search_groups")]
    pub groups: Vec<usize>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

// Default value functions
fn default_pattern() -> String {
    DEFAULT_CITEKEY_PATTERN.to_string()
}
fn default_property() -> String {
    "CUSTOM_ID".to_string()
}
fn default_separators() -> String {
    "-_".to_string()
}
fn default_secondary_suffix() -> String {
    "-supplement".to_string()
}
fn default_note_extension() -> String {
    "org".to_string()
}
fn default_search_url() -> String {
    "https://scholar.google.com/scholar?q=%s".to_string()
}
fn default_search_groups() -> Vec<usize> {
    vec![1, 2, 3]
}
fn default_delimiter() -> String {
    "+".to_string()
}
fn default_use_cache() -> bool {
    true
}

impl Default for CitekeyConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            property: default_property(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            separators: default_separators(),
            secondary_suffix: default_secondary_suffix(),
            note_extension: default_note_extension(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            groups: default_search_groups(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            use_cache: default_use_cache(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from TOML string
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| CitekitError::ConfigParse(e.to_string()))
    }

    /// Compile the configured citekey format
    pub fn format(&self) -> crate::Result<CitekeyFormat> {
        CitekeyFormat::new(&self.citekey.pattern)
    }

    /// Notes directory, or `MissingConfiguration`
    pub fn notes_dir(&self) -> crate::Result<&Path> {
        self.directories
            .notes
            .as_deref()
            .ok_or(CitekitError::MissingConfiguration("directories.notes"))
    }

    /// Content directory, or `MissingConfiguration`
    pub fn content_dir(&self) -> crate::Result<&Path> {
        self.directories
            .content
            .as_deref()
            .ok_or(CitekitError::MissingConfiguration("directories.content"))
    }

    /// Staging directory, or `MissingConfiguration`
    pub fn stage_dir(&self) -> crate::Result<&Path> {
        self.directories
            .stage
            .as_deref()
            .ok_or(CitekitError::MissingConfiguration("directories.stage"))
    }
}
