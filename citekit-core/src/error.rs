//! Error types for citekit operations

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CitekitError {
    #[error("No file found for citekey '{citekey}' in {}", .dir.display())]
    NotFound { citekey: String, dir: PathBuf },

    #[error("Multiple files match citekey '{citekey}' ({count} candidates)")]
    AmbiguousSelection { citekey: String, count: usize },

    #[error("'{0}' is not a valid citekey")]
    InvalidCitekey(String),

    #[error("Rename target already exists: {}", .target.display())]
    RenameConflict { target: PathBuf },

    #[error("Missing configuration: {0} is not set")]
    MissingConfiguration(&'static str),

    #[error("Invalid citekey pattern: {0}")]
    Pattern(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Config already exists at {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
