//! Document model for outline-format note files
//!
//! Notes are plain text with `* Title` headings (level = number of leading
//! stars) and `:KEY: value` property lines attached to the heading above
//! them. The matcher and index only see this view; any format that can
//! produce headings with titles, properties and spans would do.

use crate::error::CitekitError;
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Byte range in source text (always byte offsets, not char indices)
pub type Span = Range<usize>;

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\*+)[ \t]+(.*?)[ \t\r]*$").unwrap())
}

fn property_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*:([A-Za-z][A-Za-z0-9_-]*):[ \t]*(.*?)[ \t\r]*$").unwrap())
}

/// A heading and its subtree
#[derive(Debug, Clone)]
pub struct Heading {
    pub title: String,
    /// Nesting depth, 1 for top level
    pub level: usize,
    /// Property lines attached to this heading
    pub properties: BTreeMap<String, String>,
    /// Byte range of the whole subtree, heading line included
    pub span: Span,
    /// Byte range of the heading line itself
    pub line_span: Span,
    /// Index of the enclosing heading, `None` at top level
    pub parent: Option<usize>,
}

/// A parsed note document
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    source: String,
    headings: Vec<Heading>,
    /// Byte ranges of property lines, for structural-position checks
    property_spans: Vec<Span>,
}

impl Document {
    /// Parse already-read source text
    pub fn parse(path: impl Into<PathBuf>, source: String) -> Self {
        let mut headings: Vec<Heading> = Vec::new();
        let mut property_spans: Vec<Span> = Vec::new();
        // Open headings as (level, index) pairs, innermost last
        let mut stack: Vec<(usize, usize)> = Vec::new();

        let mut offset = 0;
        for line in source.split_inclusive('\n') {
            let line_start = offset;
            offset += line.len();
            let trimmed = line.strip_suffix('\n').unwrap_or(line);

            if let Some(caps) = heading_re().captures(trimmed) {
                let level = caps[1].len();
                while let Some(&(open_level, idx)) = stack.last() {
                    if open_level < level {
                        break;
                    }
                    headings[idx].span.end = line_start;
                    stack.pop();
                }
                let parent = stack.last().map(|&(_, idx)| idx);
                headings.push(Heading {
                    title: caps[2].to_string(),
                    level,
                    properties: BTreeMap::new(),
                    span: line_start..source.len(),
                    line_span: line_start..line_start + trimmed.len(),
                    parent,
                });
                stack.push((level, headings.len() - 1));
            } else if let Some(caps) = property_re().captures(trimmed) {
                let key = &caps[1];
                // Drawer delimiters carry no value
                if key.eq_ignore_ascii_case("PROPERTIES") || key.eq_ignore_ascii_case("END") {
                    continue;
                }
                property_spans.push(line_start..line_start + trimmed.len());
                if let Some(&(_, idx)) = stack.last() {
                    headings[idx]
                        .properties
                        .insert(key.to_string(), caps[2].to_string());
                }
            }
        }

        Self {
            path: path.into(),
            source,
            headings,
            property_spans,
        }
    }

    /// Read and parse one file
    pub fn open(path: &Path) -> crate::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(path, source))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// Index of the innermost heading whose subtree contains `pos`
    pub fn heading_at(&self, pos: usize) -> Option<usize> {
        // Sibling subtrees are disjoint, so the last containing heading in
        // document order is the innermost one.
        let mut found = None;
        for (i, h) in self.headings.iter().enumerate() {
            if h.span.contains(&pos) {
                found = Some(i);
            }
        }
        found
    }

    /// True when `pos` sits on a heading line or a property line
    pub fn is_structural_offset(&self, pos: usize) -> bool {
        self.headings.iter().any(|h| h.line_span.contains(&pos))
            || self.property_spans.iter().any(|s| s.contains(&pos))
    }
}

/// Load every note document in `dir` with the given extension, sorted by
/// path. Non-recursive; subdirectories are ignored.
pub fn load_documents(dir: &Path, extension: &str) -> crate::Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(CitekitError::NotADirectory(dir.to_path_buf()));
    }
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        docs.push(Document::open(&path)?);
    }
    tracing::debug!("loaded {} note documents from {}", docs.len(), dir.display());
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
preamble text
* jones1999theory
:PROPERTIES:
:ROAM_KEY: something
:END:
body under jones
** Deep dive
nested body
* Reading list
:CUSTOM_ID: doe2001study
more body
";

    fn doc() -> Document {
        Document::parse("notes.org", SAMPLE.to_string())
    }

    #[test]
    fn test_parses_headings_and_levels() {
        let d = doc();
        let titles: Vec<&str> = d.headings().iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["jones1999theory", "Deep dive", "Reading list"]);
        assert_eq!(d.headings()[0].level, 1);
        assert_eq!(d.headings()[1].level, 2);
        assert_eq!(d.headings()[1].parent, Some(0));
        assert_eq!(d.headings()[2].parent, None);
    }

    #[test]
    fn test_properties_attach_to_heading() {
        let d = doc();
        assert_eq!(
            d.headings()[0].properties.get("ROAM_KEY").map(String::as_str),
            Some("something")
        );
        assert_eq!(
            d.headings()[2].properties.get("CUSTOM_ID").map(String::as_str),
            Some("doe2001study")
        );
        // drawer markers are not properties
        assert!(!d.headings()[0].properties.contains_key("PROPERTIES"));
        assert!(!d.headings()[0].properties.contains_key("END"));
    }

    #[test]
    fn test_subtree_spans_nest() {
        let d = doc();
        let outer = &d.headings()[0].span;
        let inner = &d.headings()[1].span;
        assert!(outer.start < inner.start && inner.end <= outer.end);
        // second top-level heading starts where the first subtree ends
        assert_eq!(d.headings()[2].span.start, outer.end);
        assert_eq!(d.headings()[2].span.end, SAMPLE.len());
    }

    #[test]
    fn test_heading_at_is_innermost() {
        let d = doc();
        let nested_pos = SAMPLE.find("nested body").unwrap();
        assert_eq!(d.heading_at(nested_pos), Some(1));
        let outer_pos = SAMPLE.find("body under jones").unwrap();
        assert_eq!(d.heading_at(outer_pos), Some(0));
        // preamble precedes every heading
        assert_eq!(d.heading_at(0), None);
    }

    #[test]
    fn test_structural_offsets() {
        let d = doc();
        let on_title = SAMPLE.find("jones1999theory").unwrap();
        assert!(d.is_structural_offset(on_title));
        let on_property = SAMPLE.find("doe2001study").unwrap();
        assert!(d.is_structural_offset(on_property));
        let in_body = SAMPLE.find("more body").unwrap();
        assert!(!d.is_structural_offset(in_body));
    }

    #[test]
    fn test_load_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.org"), "* two\n").unwrap();
        std::fs::write(dir.path().join("a.org"), "* one\n").unwrap();
        std::fs::write(dir.path().join("ignore.txt"), "* not a note\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let docs = load_documents(dir.path(), "org").unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].path.ends_with("a.org"));
        assert!(docs[1].path.ends_with("b.org"));
    }

    #[test]
    fn test_load_documents_missing_dir() {
        assert!(matches!(
            load_documents(Path::new("/nonexistent/notes"), "org"),
            Err(CitekitError::NotADirectory(_))
        ));
    }
}
