//! Citekey index over a collection of note documents
//!
//! The index is an explicit context object holding the optional memoized
//! scan results. It is stale by design: nothing watches the documents for
//! edits, the caller clears or refreshes when it knows better. Single
//! interactive caller assumed; wrap in a mutex before sharing.

use crate::citekey::{Citekey, CitekeyFormat};
use crate::config::Config;
use crate::document::{Document, Heading};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Orphan citekeys of one document: referenced in body text, bound to no
/// heading anywhere in the collection.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanEntry {
    pub path: PathBuf,
    /// Lexicographically sorted
    pub citekeys: Vec<Citekey>,
}

/// Orphan report grouped by document, documents without orphans omitted
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrphanReport {
    pub entries: Vec<OrphanEntry>,
}

/// Citekey index with optional memoization
#[derive(Debug)]
pub struct CitekeyIndex {
    format: CitekeyFormat,
    /// Heading property that may bind a citekey (e.g. `CUSTOM_ID`)
    property: String,
    use_cache: bool,
    cached_all: Option<BTreeSet<Citekey>>,
    cached_heading_bound: Option<BTreeSet<Citekey>>,
}

impl CitekeyIndex {
    pub fn new(format: CitekeyFormat, property: impl Into<String>, use_cache: bool) -> Self {
        Self {
            format,
            property: property.into(),
            use_cache,
            cached_all: None,
            cached_heading_bound: None,
        }
    }

    /// Build an index from a config (compiles the configured pattern)
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self::new(
            config.format()?,
            config.citekey.property.clone(),
            config.index.use_cache,
        ))
    }

    pub fn format(&self) -> &CitekeyFormat {
        &self.format
    }

    /// Union of all citekey occurrences across `docs`, deduplicated.
    /// Memoized when caching is enabled; otherwise a full rescan per call.
    pub fn all_citekeys(&mut self, docs: &[Document]) -> BTreeSet<Citekey> {
        if !self.use_cache {
            return self.scan_all(docs);
        }
        if self.cached_all.is_none() {
            tracing::debug!("building all-citekeys index over {} documents", docs.len());
            self.cached_all = Some(self.scan_all(docs));
        }
        self.cached_all.clone().unwrap_or_default()
    }

    /// Citekeys bound to a heading (title or property) anywhere in `docs`.
    /// Memoized when caching is enabled.
    pub fn heading_citekeys(&mut self, docs: &[Document]) -> BTreeSet<Citekey> {
        if !self.use_cache {
            return self.scan_heading_bound(docs);
        }
        if self.cached_heading_bound.is_none() {
            tracing::debug!(
                "building heading-citekeys index over {} documents",
                docs.len()
            );
            self.cached_heading_bound = Some(self.scan_heading_bound(docs));
        }
        self.cached_heading_bound.clone().unwrap_or_default()
    }

    /// Drop both memoized sets
    pub fn clear(&mut self) {
        self.cached_all = None;
        self.cached_heading_bound = None;
    }

    /// Clear and recompute both sets from `docs`
    pub fn refresh(&mut self, docs: &[Document]) {
        self.clear();
        if self.use_cache {
            self.cached_all = Some(self.scan_all(docs));
            self.cached_heading_bound = Some(self.scan_heading_bound(docs));
        }
    }

    fn scan_all(&self, docs: &[Document]) -> BTreeSet<Citekey> {
        docs.iter()
            .flat_map(|doc| self.format.all_citekeys(doc.source()))
            .collect()
    }

    fn scan_heading_bound(&self, docs: &[Document]) -> BTreeSet<Citekey> {
        docs.iter()
            .flat_map(|doc| self.heading_citekeys_in(doc))
            .collect()
    }

    /// Heading-bound citekeys of one document
    pub fn heading_citekeys_in(&self, doc: &Document) -> BTreeSet<Citekey> {
        doc.headings()
            .iter()
            .filter_map(|h| self.citekey_for_heading(h))
            .collect()
    }

    /// Resolve the citekey a heading binds: the title when it is itself a
    /// citekey, else the value of the configured property.
    pub fn citekey_for_heading(&self, heading: &Heading) -> Option<Citekey> {
        if let Ok(key) = self.format.parse(&heading.title) {
            return Some(key);
        }
        heading
            .properties
            .get(&self.property)
            .and_then(|value| self.format.parse(value).ok())
    }

    /// Walk up from the innermost heading containing `pos`; the first
    /// ancestor that binds a citekey wins. `None` when no ancestor does.
    pub fn citekey_from_ancestry(&self, doc: &Document, pos: usize) -> Option<Citekey> {
        let mut current = doc.heading_at(pos);
        while let Some(idx) = current {
            let heading = &doc.headings()[idx];
            if let Some(key) = self.citekey_for_heading(heading) {
                return Some(key);
            }
            current = heading.parent;
        }
        None
    }

    /// Citekeys appearing in body text, excluding occurrences on heading
    /// lines and property lines.
    pub fn non_heading_citekeys(&self, doc: &Document) -> BTreeSet<Citekey> {
        self.format
            .citekey_occurrences(doc.source())
            .into_iter()
            .filter(|(range, _)| !doc.is_structural_offset(range.start))
            .map(|(_, key)| key)
            .collect()
    }

    /// Per-document orphans: body-text citekeys with no heading binding
    /// anywhere in the collection.
    pub fn orphan_report(&mut self, docs: &[Document]) -> OrphanReport {
        let bound = self.heading_citekeys(docs);
        let mut entries = Vec::new();
        for doc in docs {
            let orphans: Vec<Citekey> = self
                .non_heading_citekeys(doc)
                .into_iter()
                .filter(|key| !bound.contains(key))
                .collect();
            if !orphans.is_empty() {
                entries.push(OrphanEntry {
                    path: doc.path.clone(),
                    citekeys: orphans,
                });
            }
        }
        OrphanReport { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citekey::CitekeyFormat;

    fn index(use_cache: bool) -> CitekeyIndex {
        CitekeyIndex::new(CitekeyFormat::default_format(), "CUSTOM_ID", use_cache)
    }

    fn doc(path: &str, source: &str) -> Document {
        Document::parse(path, source.to_string())
    }

    #[test]
    fn test_all_citekeys_union() {
        let docs = vec![
            doc("a.org", "* smith2020lexicon\nsee doe2001study\n"),
            doc("b.org", "mentions smith2020lexicon again\n"),
        ];
        let mut idx = index(false);
        let keys = idx.all_citekeys(&docs);
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().any(|k| k.as_str() == "smith2020lexicon"));
        assert!(keys.iter().any(|k| k.as_str() == "doe2001study"));
    }

    #[test]
    fn test_heading_citekeys_title_and_property() {
        let d = doc(
            "a.org",
            "* jones1999theory\nbody\n* Reading notes\n:CUSTOM_ID: doe2001study\nbody\n* Unbound\nbody\n",
        );
        let idx = index(false);
        let keys = idx.heading_citekeys_in(&d);
        let strs: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(strs, vec!["doe2001study", "jones1999theory"]);
    }

    #[test]
    fn test_title_beats_property() {
        let d = doc(
            "a.org",
            "* jones1999theory\n:CUSTOM_ID: doe2001study\nbody\n",
        );
        let idx = index(false);
        assert_eq!(
            idx.citekey_for_heading(&d.headings()[0])
                .map(|k| k.to_string()),
            Some("jones1999theory".to_string())
        );
    }

    #[test]
    fn test_citekey_from_ancestry() {
        let source = "\
* jones1999theory
** Methods
*** Detail
deep body
** smith2020lexicon
inner body
* No key here
stray body
";
        let d = doc("a.org", source);
        let idx = index(false);

        let deep = source.find("deep body").unwrap();
        // innermost ancestors (Detail, Methods) bind nothing; the top does
        assert_eq!(
            idx.citekey_from_ancestry(&d, deep).map(|k| k.to_string()),
            Some("jones1999theory".to_string())
        );

        let inner = source.find("inner body").unwrap();
        assert_eq!(
            idx.citekey_from_ancestry(&d, inner).map(|k| k.to_string()),
            Some("smith2020lexicon".to_string())
        );

        let stray = source.find("stray body").unwrap();
        assert_eq!(idx.citekey_from_ancestry(&d, stray), None);
    }

    #[test]
    fn test_non_heading_citekeys() {
        let d = doc(
            "a.org",
            "* jones1999theory\n:CUSTOM_ID: held2010frame\nprose cites doe2001study here\n",
        );
        let idx = index(false);
        let keys = idx.non_heading_citekeys(&d);
        let strs: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        // title and property occurrences are structural, only prose counts
        assert_eq!(strs, vec!["doe2001study"]);
    }

    #[test]
    fn test_orphan_report() {
        let docs = vec![
            doc("a.org", "* doe2001study\nbody cites zhu2015model\n"),
            doc("b.org", "prose with doe2001study and kim2018net\n"),
        ];
        let mut idx = index(false);
        let report = idx.orphan_report(&docs);
        // doe2001study is heading-bound in a.org, never an orphan anywhere
        assert_eq!(report.entries.len(), 2);
        assert!(report.entries[0].path.ends_with("a.org"));
        let a: Vec<&str> = report.entries[0].citekeys.iter().map(|k| k.as_str()).collect();
        assert_eq!(a, vec!["zhu2015model"]);
        let b: Vec<&str> = report.entries[1].citekeys.iter().map(|k| k.as_str()).collect();
        assert_eq!(b, vec!["kim2018net"]);
    }

    #[test]
    fn test_cache_is_stale_until_cleared() {
        let mut idx = index(true);
        let docs1 = vec![doc("a.org", "smith2020lexicon\n")];
        assert_eq!(idx.all_citekeys(&docs1).len(), 1);

        // memoized result survives a different document set
        let docs2 = vec![doc("a.org", "smith2020lexicon and doe2001study\n")];
        assert_eq!(idx.all_citekeys(&docs2).len(), 1);

        idx.clear();
        assert_eq!(idx.all_citekeys(&docs2).len(), 2);
    }

    #[test]
    fn test_refresh_recomputes() {
        let mut idx = index(true);
        let docs = vec![doc("a.org", "* smith2020lexicon\n")];
        idx.all_citekeys(&[]);
        idx.refresh(&docs);
        assert_eq!(idx.all_citekeys(&[]).len(), 1); // served from cache
        assert_eq!(idx.heading_citekeys(&[]).len(), 1);
    }

    #[test]
    fn test_uncached_always_rescans() {
        let mut idx = index(false);
        let docs1 = vec![doc("a.org", "smith2020lexicon\n")];
        let docs2 = vec![doc("a.org", "smith2020lexicon and doe2001study\n")];
        assert_eq!(idx.all_citekeys(&docs1).len(), 1);
        assert_eq!(idx.all_citekeys(&docs2).len(), 2);
    }
}
