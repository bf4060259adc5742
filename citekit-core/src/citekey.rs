//! Citekey format and matching
//!
//! A citekey is a short token identifying one study (e.g. `smith2020lexicon`:
//! author + year + first title word). The format is a configurable regular
//! expression; every `Citekey` value in this crate is produced by one of the
//! `CitekeyFormat` matchers, never hand-built.

use crate::error::CitekitError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Default citekey pattern: lowercase author (hyphens allowed for multi-author
/// keys), four-digit year, lowercase alphanumeric title word.
pub const DEFAULT_CITEKEY_PATTERN: &str =
    r"\b(?P<author>[a-z][a-z-]*)(?P<year>[0-9]{4})(?P<word>[a-z0-9]+)\b";

/// A validated citekey.
///
/// Construction goes through [`CitekeyFormat`]; the inner string is guaranteed
/// to match the configured pattern at the time it was extracted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Citekey(String);

impl Citekey {
    fn new(s: &str) -> Self {
        Citekey(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Citekey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Citekey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compiled citekey format: a word-boundary-anchored scan pattern plus a
/// whole-string form of the same pattern, with the ordered capture group names.
#[derive(Debug, Clone)]
pub struct CitekeyFormat {
    /// Boundary-anchored form used for scanning text.
    scan: Regex,
    /// `^(?:pattern)$` form used for whole-string validation.
    full: Regex,
    /// Capture group names in pattern order (`None` for unnamed groups).
    group_names: Vec<Option<String>>,
}

/// True for characters that can appear inside a citekey token. Used when
/// extending a word span around a cursor position; plain word boundaries
/// would split on the hyphen.
fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

/// Detect an inline `(?i...)` flag group enabling case-insensitive matching.
fn enables_case_insensitivity(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'(' && bytes[i + 1] == b'?' {
            let mut j = i + 2;
            // Flags run until ':', ')' or the '-' that starts cleared flags.
            while j < bytes.len() && !matches!(bytes[j], b':' | b')' | b'-') {
                if bytes[j] == b'i' {
                    return true;
                }
                j += 1;
            }
        }
        i += 1;
    }
    false
}

impl CitekeyFormat {
    /// Compile a citekey format from a pattern string.
    ///
    /// The pattern must compile, must be case-sensitive (inline `(?i)` flags
    /// are rejected), and must contain at least one capture group so the
    /// search query builder has parts to work with. A pattern without leading
    /// and trailing `\b` assertions is wrapped in them for scanning, so
    /// matches are always whole tokens.
    pub fn new(pattern: &str) -> crate::Result<Self> {
        if enables_case_insensitivity(pattern) {
            return Err(CitekitError::Pattern(format!(
                "pattern must be case-sensitive, found inline (?i) flag: {}",
                pattern
            )));
        }

        let anchored = if pattern.starts_with(r"\b") && pattern.ends_with(r"\b") {
            pattern.to_string()
        } else {
            format!(r"\b(?:{})\b", pattern)
        };
        let scan = Regex::new(&anchored).map_err(|e| CitekitError::Pattern(e.to_string()))?;
        let full = Regex::new(&format!("^(?:{})$", pattern))
            .map_err(|e| CitekitError::Pattern(e.to_string()))?;

        let group_names: Vec<Option<String>> = full
            .capture_names()
            .skip(1)
            .map(|n| n.map(String::from))
            .collect();
        if group_names.is_empty() {
            return Err(CitekitError::Pattern(format!(
                "pattern has no capture groups: {}",
                pattern
            )));
        }

        Ok(Self {
            scan,
            full,
            group_names,
        })
    }

    /// The default format (`smith2020lexicon` style keys).
    pub fn default_format() -> Self {
        Self::new(DEFAULT_CITEKEY_PATTERN).expect("built-in citekey pattern compiles")
    }

    /// Capture group names in pattern order.
    pub fn group_names(&self) -> &[Option<String>] {
        &self.group_names
    }

    /// Whole-string, case-sensitive validation.
    pub fn is_citekey(&self, text: &str) -> bool {
        self.full.is_match(text)
    }

    /// Validate `text` as a citekey, or fail with `InvalidCitekey`.
    pub fn parse(&self, text: &str) -> crate::Result<Citekey> {
        if self.is_citekey(text) {
            Ok(Citekey::new(text))
        } else {
            Err(CitekitError::InvalidCitekey(text.to_string()))
        }
    }

    /// Extract the citekey at a byte position in `text`, if any.
    ///
    /// The word span around `pos` is extended in both directions treating
    /// hyphen and underscore as word constituents, then the pattern is tested
    /// against the span; only a match anchored at the span start counts.
    pub fn citekey_at(&self, text: &str, pos: usize) -> Option<Citekey> {
        let mut pos = pos.min(text.len());
        while pos > 0 && !text.is_char_boundary(pos) {
            pos -= 1;
        }

        let mut start = pos;
        for (i, c) in text[..pos].char_indices().rev() {
            if !is_token_char(c) {
                break;
            }
            start = i;
        }
        let mut end = pos;
        for (i, c) in text[pos..].char_indices() {
            if !is_token_char(c) {
                break;
            }
            end = pos + i + c.len_utf8();
        }
        if start == end {
            return None;
        }

        let span = &text[start..end];
        // Leftmost match; anything not anchored at the span start is some
        // inner fragment, not the token under the cursor.
        let m = self.scan.find(span)?;
        if m.start() != 0 {
            return None;
        }
        Some(Citekey::new(m.as_str()))
    }

    /// All citekeys in `text`, deduplicated. Full-text scanning relies on the
    /// regex engine's own word boundaries, not the cursor-span rules.
    pub fn all_citekeys(&self, text: &str) -> BTreeSet<Citekey> {
        self.scan
            .find_iter(text)
            .map(|m| Citekey::new(m.as_str()))
            .collect()
    }

    /// All citekey matches in `text` with their byte ranges, in document
    /// order and not deduplicated.
    pub fn citekey_occurrences(&self, text: &str) -> Vec<(std::ops::Range<usize>, Citekey)> {
        self.scan
            .find_iter(text)
            .map(|m| (m.range(), Citekey::new(m.as_str())))
            .collect()
    }

    /// The citekey prefix anchored at the start of `text`, if any. Used to
    /// read citekeys off file names like `smith2020lexicon-notes.pdf`.
    pub fn leading_citekey(&self, text: &str) -> Option<Citekey> {
        let m = self.scan.find(text)?;
        if m.start() != 0 {
            return None;
        }
        Some(Citekey::new(m.as_str()))
    }

    /// Capture group values for a citekey, in pattern order. Fails with
    /// `InvalidCitekey` when the string does not match the format.
    pub fn capture_groups(&self, citekey: &str) -> crate::Result<Vec<String>> {
        let caps = self
            .full
            .captures(citekey)
            .ok_or_else(|| CitekitError::InvalidCitekey(citekey.to_string()))?;
        Ok((1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> CitekeyFormat {
        CitekeyFormat::default_format()
    }

    #[test]
    fn test_is_citekey() {
        let f = fmt();
        assert!(f.is_citekey("smith2020lexicon"));
        assert!(f.is_citekey("smith-jones2020lexicon"));
        assert!(f.is_citekey("doe2001study"));
        assert!(!f.is_citekey("Smith2020lexicon")); // case-sensitive
        assert!(!f.is_citekey("smith2020"));
        assert!(!f.is_citekey("smith2020lexicon extra"));
        assert!(!f.is_citekey(""));
    }

    #[test]
    fn test_citekey_at_inside_token() {
        let f = fmt();
        let text = "see smith2020lexicon here";
        // every position inside the token resolves to the token
        for pos in 4..20 {
            assert_eq!(
                f.citekey_at(text, pos).map(|k| k.to_string()),
                Some("smith2020lexicon".to_string()),
                "pos {}",
                pos
            );
        }
    }

    #[test]
    fn test_citekey_at_outside_token() {
        let f = fmt();
        let text = "see smith2020lexicon here";
        assert_eq!(f.citekey_at(text, 22), None); // inside "here"
        assert_eq!(f.citekey_at(text, 1), None); // inside "see"
    }

    #[test]
    fn test_citekey_at_end_of_text() {
        let f = fmt();
        let text = "smith2020lexicon";
        assert_eq!(
            f.citekey_at(text, text.len()).map(|k| k.to_string()),
            Some("smith2020lexicon".to_string())
        );
    }

    #[test]
    fn test_citekey_at_rejects_suffixed_token() {
        let f = fmt();
        // underscore extends the span; the anchored match stops at "lexicon"
        // but the regex \b cannot assert a boundary before '_', so the span
        // as a whole carries no anchored match.
        assert_eq!(f.citekey_at("smith2020lexicon_draft ok", 3), None);
    }

    #[test]
    fn test_all_citekeys_dedup() {
        let f = fmt();
        let keys = f.all_citekeys("smith2020lexicon and smith2020lexicon again");
        assert_eq!(keys.len(), 1);
        let keys = f.all_citekeys("smith2020lexicon, doe2001study.");
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_leading_citekey() {
        let f = fmt();
        assert_eq!(
            f.leading_citekey("smith2020lexicon-notes.pdf")
                .map(|k| k.to_string()),
            Some("smith2020lexicon".to_string())
        );
        assert_eq!(f.leading_citekey("README.md"), None);
    }

    #[test]
    fn test_leading_citekey_hyphenated_prefix_extends_key() {
        let f = fmt();
        // hyphens are author-group characters, so the whole run is the key
        assert_eq!(
            f.leading_citekey("notes-smith2020lexicon.pdf")
                .map(|k| k.to_string()),
            Some("notes-smith2020lexicon".to_string())
        );
        // a prefix outside the format leaves no match anchored at the start
        assert_eq!(f.leading_citekey("Notes-smith2020lexicon.pdf"), None);
    }

    #[test]
    fn test_capture_groups() {
        let f = fmt();
        assert_eq!(
            f.capture_groups("smith2020lexicon").unwrap(),
            vec!["smith", "2020", "lexicon"]
        );
        assert!(matches!(
            f.capture_groups("Not A Key"),
            Err(CitekitError::InvalidCitekey(_))
        ));
    }

    #[test]
    fn test_rejects_case_insensitive_pattern() {
        assert!(matches!(
            CitekeyFormat::new(r"(?i)(?P<author>[a-z]+)"),
            Err(CitekitError::Pattern(_))
        ));
        assert!(matches!(
            CitekeyFormat::new(r"(?im:[a-z]+)(?P<year>[0-9]{4})"),
            Err(CitekitError::Pattern(_))
        ));
        // clearing the flag is fine
        assert!(CitekeyFormat::new(r"(?-i:(?P<author>[a-z]+))[0-9]{4}").is_ok());
    }

    #[test]
    fn test_rejects_pattern_without_groups() {
        assert!(matches!(
            CitekeyFormat::new(r"[a-z]+[0-9]{4}"),
            Err(CitekitError::Pattern(_))
        ));
    }

    #[test]
    fn test_parse() {
        let f = fmt();
        assert!(f.parse("smith2020lexicon").is_ok());
        assert!(matches!(
            f.parse("smith"),
            Err(CitekitError::InvalidCitekey(_))
        ));
    }
}
