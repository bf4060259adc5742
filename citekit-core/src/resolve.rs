//! File resolution: locating and renaming study files by citekey
//!
//! Content files carry canonical names: `<citekey>.<ext>` for the primary
//! file, `<citekey><sep><suffix>.<ext>` for anything else. The staging
//! directory holds loosely named new arrivals until they are renamed in.

use crate::citekey::{Citekey, CitekeyFormat};
use crate::error::CitekitError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Caller's answer to a proposed fallback name on a rename conflict.
/// The prompt itself lives with the caller; the core only sees the outcome.
#[derive(Debug, Clone)]
pub enum RenameDecision {
    /// Take the proposed name
    Accept,
    /// Use this file name instead (relative to the content directory)
    Rename(String),
    /// Give up; the staged file stays where it is
    Cancel,
}

fn file_name_str(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// True when `name` is `<citekey>`, `<citekey>.<ext>` or
/// `<citekey><sep>...` for one of the configured separators.
fn name_matches(name: &str, citekey: &str, separators: &str) -> bool {
    match name.strip_prefix(citekey) {
        None => false,
        Some("") => true,
        Some(rest) => {
            let next = rest.chars().next().unwrap_or('\0');
            next == '.' || separators.contains(next)
        }
    }
}

/// Files in `content_dir` associated with `citekey`, sorted.
///
/// Non-recursive; subdirectories are skipped. Zero matches is `NotFound`.
/// Multiple matches are all returned, choosing one is the caller's problem.
pub fn files_for_citekey(
    citekey: &Citekey,
    content_dir: &Path,
    separators: &str,
) -> crate::Result<Vec<PathBuf>> {
    if !content_dir.is_dir() {
        return Err(CitekitError::NotADirectory(content_dir.to_path_buf()));
    }
    let mut matches: Vec<PathBuf> = std::fs::read_dir(content_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| name_matches(&file_name_str(path), citekey.as_str(), separators))
        .collect();
    matches.sort();

    if matches.is_empty() {
        return Err(CitekitError::NotFound {
            citekey: citekey.to_string(),
            dir: content_dir.to_path_buf(),
        });
    }
    tracing::debug!(
        "{} file(s) for citekey {} in {}",
        matches.len(),
        citekey,
        content_dir.display()
    );
    Ok(matches)
}

/// Like [`files_for_citekey`], but for callers that will not disambiguate:
/// more than one candidate is `AmbiguousSelection`.
pub fn single_file_for_citekey(
    citekey: &Citekey,
    content_dir: &Path,
    separators: &str,
) -> crate::Result<PathBuf> {
    let mut files = files_for_citekey(citekey, content_dir, separators)?;
    if files.len() > 1 {
        return Err(CitekitError::AmbiguousSelection {
            citekey: citekey.to_string(),
            count: files.len(),
        });
    }
    Ok(files.remove(0))
}

/// Rename a staged file to its canonical citekey name in `content_dir`.
///
/// Target is `<citekey>.<ext>` with the staged file's extension. When the
/// target exists, `<citekey><secondary_suffix>.<ext>` is proposed through
/// `confirm`, which may accept, edit, or cancel. One retry round: a second
/// collision is a `RenameConflict`.
///
/// The existence check and the rename are not atomic; a concurrent writer
/// could still take the target in between. Single-user tool, accepted.
pub fn rename_staged_file(
    staged: &Path,
    citekey: &Citekey,
    content_dir: &Path,
    secondary_suffix: &str,
    confirm: impl FnOnce(&Path) -> RenameDecision,
) -> crate::Result<PathBuf> {
    if !content_dir.is_dir() {
        return Err(CitekitError::NotADirectory(content_dir.to_path_buf()));
    }
    let extension = staged.extension().and_then(|e| e.to_str());
    let with_ext = |stem: &str| match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    };

    let target = content_dir.join(with_ext(citekey.as_str()));
    if !target.exists() {
        std::fs::rename(staged, &target)?;
        tracing::debug!("renamed {} -> {}", staged.display(), target.display());
        return Ok(target);
    }

    let proposed = content_dir.join(with_ext(&format!("{}{}", citekey, secondary_suffix)));
    tracing::debug!(
        "target {} exists, proposing {}",
        target.display(),
        proposed.display()
    );
    let fallback = match confirm(&proposed) {
        RenameDecision::Accept => proposed,
        RenameDecision::Rename(name) => content_dir.join(name),
        RenameDecision::Cancel => return Err(CitekitError::RenameConflict { target }),
    };
    if fallback.exists() {
        return Err(CitekitError::RenameConflict { target: fallback });
    }
    std::fs::rename(staged, &fallback)?;
    tracing::debug!("renamed {} -> {}", staged.display(), fallback.display());
    Ok(fallback)
}

/// Citekeys readable off the file names in `content_dir`: the leading
/// format-matching prefix of each base name, deduplicated.
pub fn all_file_citekeys(
    content_dir: &Path,
    format: &CitekeyFormat,
) -> crate::Result<BTreeSet<Citekey>> {
    if !content_dir.is_dir() {
        return Err(CitekitError::NotADirectory(content_dir.to_path_buf()));
    }
    Ok(std::fs::read_dir(content_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| format.leading_citekey(&file_name_str(&entry.path())))
        .collect())
}

/// Regular files waiting in the staging directory, sorted.
pub fn stage_files(stage_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    if !stage_dir.is_dir() {
        return Err(CitekitError::NotADirectory(stage_dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(stage_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}
