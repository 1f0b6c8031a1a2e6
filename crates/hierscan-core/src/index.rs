//! The index service seam.
//!
//! The search core never owns index storage. It asks an [`Index`] for the raw
//! entries of a category that satisfy a lookup key under a match rule, and
//! receives them as a lazy iterator. [`MemoryIndex`] is an in-process,
//! append-only implementation used by the CLI and by tests.

use std::collections::BTreeMap;
use std::fmt;

use globset::GlobMatcher;
use regex::Regex;
use thiserror::Error;

use crate::codec::{encode_edge, IndexKey};
use crate::error::SearchError;
use crate::facts::SuperTypeEdge;
use crate::matcher::{compile_glob, compile_regex};
use crate::pattern::{MatchMode, MatchRule};

// ============================================================================
// Categories and Entries
// ============================================================================

/// An index category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Category(&'static str);

impl Category {
    pub const fn new(tag: &'static str) -> Self {
        Category(tag)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Category holding supertype-reference keys.
pub const SUPER_REF: Category = Category::new("superRef");

/// One stored entry: a key and the document it was indexed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawEntry {
    pub key: IndexKey,
    pub document: String,
}

/// Lazy, finite sequence of entries returned by an index.
pub type EntryIter<'a> = Box<dyn Iterator<Item = RawEntry> + Send + 'a>;

/// Failures reported by an index service.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The index cannot evaluate the lookup it was given.
    #[error("invalid index query '{pattern}': {message}")]
    InvalidQuery { pattern: String, message: String },

    #[error("index unavailable: {message}")]
    Unavailable { message: String },
}

/// An inverted index that can be queried by category, key and rule.
///
/// `key = None` selects every entry of the categories. The rule tells the
/// index how to compare `key` with stored keys; a camel-case rule means the
/// index cannot narrow the lookup and returns the whole category.
pub trait Index: Send + Sync {
    fn query<'a>(
        &'a self,
        categories: &[Category],
        key: Option<&IndexKey>,
        rule: MatchRule,
    ) -> Result<EntryIter<'a>, IndexError>;
}

// ============================================================================
// Key Filters
// ============================================================================

/// A lookup key compiled against one rule.
enum KeyFilter {
    All,
    Exact(IndexKey),
    ExactIgnoreCase(IndexKey),
    Prefix(IndexKey),
    PrefixIgnoreCase(IndexKey),
    Glob(GlobMatcher),
    Regex(Regex),
}

impl KeyFilter {
    fn compile(key: Option<&IndexKey>, rule: MatchRule) -> Result<Self, IndexError> {
        let Some(key) = key else {
            return Ok(KeyFilter::All);
        };
        if rule.is_camel_case() {
            return Ok(KeyFilter::All);
        }

        let invalid = |err: SearchError| IndexError::InvalidQuery {
            pattern: key.to_string(),
            message: err.to_string(),
        };
        let text = String::from_utf16_lossy(key.units());

        Ok(match (rule.mode, rule.case_sensitive) {
            (MatchMode::Exact, true) => KeyFilter::Exact(key.clone()),
            (MatchMode::Exact, false) => KeyFilter::ExactIgnoreCase(key.clone()),
            (MatchMode::Prefix, true) => KeyFilter::Prefix(key.clone()),
            (MatchMode::Prefix, false) => KeyFilter::PrefixIgnoreCase(key.clone()),
            (MatchMode::Glob, case_sensitive) => {
                KeyFilter::Glob(compile_glob(&text, case_sensitive).map_err(invalid)?)
            }
            (MatchMode::Regexp, case_sensitive) => {
                KeyFilter::Regex(compile_regex(&text, case_sensitive).map_err(invalid)?)
            }
        })
    }

    fn accepts(&self, stored: &IndexKey) -> bool {
        match self {
            KeyFilter::All => true,
            KeyFilter::Exact(key) => stored == key,
            KeyFilter::ExactIgnoreCase(key) => stored.eq_ignore_case(key),
            KeyFilter::Prefix(key) => stored.starts_with(key),
            KeyFilter::PrefixIgnoreCase(key) => stored.starts_with_ignore_case(key),
            KeyFilter::Glob(glob) => glob.is_match(stored.leading_word()),
            KeyFilter::Regex(regex) => regex.is_match(&stored.leading_word()),
        }
    }
}

// ============================================================================
// Memory Index
// ============================================================================

/// An append-only in-memory index.
///
/// Keys are kept sorted per category, so exact and case-sensitive prefix
/// lookups read only the matching key range. Documents sharing a key are
/// returned in insertion order; each (key, document) pair is stored once.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    categories: BTreeMap<Category, BTreeMap<IndexKey, Vec<String>>>,
    len: usize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        MemoryIndex::default()
    }

    /// Add one entry. Re-adding a (key, document) pair already present is a no-op.
    pub fn add(&mut self, category: Category, key: IndexKey, document: impl Into<String>) {
        let document = document.into();
        let documents = self
            .categories
            .entry(category)
            .or_default()
            .entry(key)
            .or_default();
        if !documents.contains(&document) {
            documents.push(document);
            self.len += 1;
        }
    }

    /// Encode `edge` and add it to the supertype-reference category.
    pub fn index_edge(&mut self, document: impl Into<String>, edge: &SuperTypeEdge) -> IndexKey {
        let key = encode_edge(edge);
        self.add(SUPER_REF, key.clone(), document);
        key
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Narrow a sorted key map to the range a filter can possibly accept.
fn candidate_keys<'a>(
    keys: &'a BTreeMap<IndexKey, Vec<String>>,
    filter: &KeyFilter,
) -> Box<dyn Iterator<Item = (&'a IndexKey, &'a Vec<String>)> + Send + 'a> {
    match filter {
        KeyFilter::Exact(key) => Box::new(keys.get_key_value(key).into_iter()),
        KeyFilter::Prefix(prefix) => {
            let prefix = prefix.clone();
            Box::new(
                keys.range(prefix.clone()..)
                    .take_while(move |(key, _)| key.starts_with(&prefix)),
            )
        }
        _ => Box::new(keys.iter()),
    }
}

impl Index for MemoryIndex {
    fn query<'a>(
        &'a self,
        categories: &[Category],
        key: Option<&IndexKey>,
        rule: MatchRule,
    ) -> Result<EntryIter<'a>, IndexError> {
        let filter = KeyFilter::compile(key, rule)?;

        let mut sources = Vec::new();
        for category in categories {
            match self.categories.get(category) {
                Some(keys) => sources.push(candidate_keys(keys, &filter)),
                None => tracing::debug!("Category {} is empty", category),
            }
        }

        Ok(Box::new(
            sources
                .into_iter()
                .flatten()
                .filter(move |(stored, _)| filter.accepts(stored))
                .flat_map(|(stored, documents)| {
                    documents.iter().map(move |document| RawEntry {
                        key: stored.clone(),
                        document: document.clone(),
                    })
                }),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> MemoryIndex {
        let mut index = MemoryIndex::new();
        index.add(SUPER_REF, IndexKey::from("Foo/a/X"), "a.src");
        index.add(SUPER_REF, IndexKey::from("FooBar/b/Y"), "b.src");
        index.add(SUPER_REF, IndexKey::from("Bar/c/Z"), "c.src");
        index.add(SUPER_REF, IndexKey::from("Foo/a/X"), "d.src");
        index.add(Category::new("other"), IndexKey::from("Foo/z"), "z.src");
        index
    }

    fn documents(index: &MemoryIndex, key: Option<&str>, rule: MatchRule) -> Vec<String> {
        let key = key.map(IndexKey::from);
        index
            .query(&[SUPER_REF], key.as_ref(), rule)
            .unwrap()
            .map(|entry| entry.document)
            .collect()
    }

    #[test]
    fn none_key_returns_whole_category() {
        let index = index();
        assert_eq!(index.len(), 5);
        assert_eq!(documents(&index, None, MatchRule::exact()).len(), 4);
    }

    #[test]
    fn exact_key_lookup() {
        assert_eq!(
            documents(&index(), Some("Foo/a/X"), MatchRule::exact()),
            ["a.src", "d.src"]
        );
        assert!(documents(&index(), Some("foo/a/x"), MatchRule::exact()).is_empty());
        assert_eq!(
            documents(&index(), Some("foo/a/x"), MatchRule::exact().case_insensitive()).len(),
            2
        );
    }

    #[test]
    fn prefix_lookup_uses_key_order() {
        assert_eq!(
            documents(&index(), Some("Foo/"), MatchRule::prefix()),
            ["a.src", "d.src"]
        );
        assert_eq!(
            documents(&index(), Some("Foo"), MatchRule::prefix()),
            ["a.src", "d.src", "b.src"]
        );
        assert_eq!(
            documents(&index(), Some("foo/"), MatchRule::prefix().case_insensitive()),
            ["a.src", "d.src"]
        );
    }

    #[test]
    fn glob_and_regex_read_leading_word() {
        assert_eq!(
            documents(&index(), Some("*Bar"), MatchRule::glob()),
            ["c.src", "b.src"]
        );
        assert_eq!(
            documents(&index(), Some("Foo.*"), MatchRule::regexp()),
            ["a.src", "d.src", "b.src"]
        );
    }

    #[test]
    fn camel_rule_scans_category() {
        assert_eq!(
            documents(&index(), Some("FB"), MatchRule::exact().camel_case()).len(),
            4
        );
    }

    #[test]
    fn invalid_regex_is_reported() {
        let key = IndexKey::from("(");
        let index = index();
        let result = index.query(&[SUPER_REF], Some(&key), MatchRule::regexp());
        assert!(matches!(result, Err(IndexError::InvalidQuery { .. })));
    }

    #[test]
    fn duplicate_entries_are_stored_once() {
        let mut index = index();
        index.add(SUPER_REF, IndexKey::from("Foo/a/X"), "a.src");
        assert_eq!(index.len(), 5);
        assert_eq!(
            documents(&index, Some("Foo/a/X"), MatchRule::exact()),
            ["a.src", "d.src"]
        );
    }

    #[test]
    fn unknown_category_is_empty() {
        let index = index();
        let entries: Vec<_> = index
            .query(&[Category::new("missing")], None, MatchRule::exact())
            .unwrap()
            .collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn index_edge_stores_encoded_key() {
        let mut index = MemoryIndex::new();
        let key = index.index_edge("doc", &SuperTypeEdge::new("Impl", Some("Base")));
        let entries: Vec<_> = index
            .query(&[SUPER_REF], Some(&key), MatchRule::exact())
            .unwrap()
            .collect();
        assert_eq!(entries, [RawEntry { key, document: "doc".to_string() }]);
    }
}
