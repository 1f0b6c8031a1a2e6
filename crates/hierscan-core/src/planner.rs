//! Query planning and execution.
//!
//! A [`QueryPattern`] is rewritten into a [`LookupPlan`] the index can
//! execute cheaply, the plan is run against an [`Index`], and the raw entries
//! are decoded and filtered by a compiled [`PatternMatcher`]:
//!
//! ```text
//! plan(pattern) -> execute(index, plan) -> filter(entries, matcher)
//! ```
//!
//! ## Rewrite rules
//!
//! | Pattern rule | Lookup key | Lookup rule |
//! |--------------|------------|-------------|
//! | no simple name | `None` | unchanged |
//! | `Exact` | `name/` | `Prefix` |
//! | `Exact` + camel case | `name` | unchanged (index scans) |
//! | `Prefix`, `Glob`, `Regexp` | `name` | unchanged |
//!
//! Every key starts with the supertype simple name followed by a separator,
//! so the `Exact` rewrite returns exactly the entries for that name. The
//! qualification never contributes to the key; it is checked by the matcher.
//!
//! Results are lazy. Corrupt entries are skipped with a warning and counted
//! instead of failing the query.

use std::collections::HashSet;

use crate::codec::{decode, IndexKey};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::facts::TypeHierarchyFact;
use crate::index::{Category, EntryIter, Index};
use crate::matcher::PatternMatcher;
use crate::pattern::{MatchMode, MatchRule, QueryPattern, SearchPattern};

// ============================================================================
// Planning
// ============================================================================

/// An index lookup derived from one query pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPlan {
    pub categories: &'static [Category],
    /// `None` reads every entry of the categories.
    pub key: Option<IndexKey>,
    pub rule: MatchRule,
}

/// Rewrite `pattern` into an index lookup.
pub fn plan(pattern: &QueryPattern, config: &SearchConfig) -> Result<LookupPlan, SearchError> {
    let rule = pattern.rule();

    if rule.mode == MatchMode::Regexp && !config.regex_enabled {
        return Err(SearchError::unsupported_mode(
            MatchMode::Regexp,
            "regular expressions are disabled by configuration",
        ));
    }

    let (key, rule) = match pattern.super_simple_name() {
        None => (None, rule),
        Some(name) if rule.mode == MatchMode::Exact && !rule.is_camel_case() => (
            Some(IndexKey::word_prefix(name)),
            rule.with_mode(MatchMode::Prefix),
        ),
        Some(name) => (Some(IndexKey::from(name)), rule),
    };

    let plan = LookupPlan {
        categories: pattern.categories(),
        key,
        rule,
    };
    tracing::debug!(
        "Planned {}: key={:?} rule={}",
        pattern,
        plan.key.as_ref().map(ToString::to_string),
        plan.rule
    );
    Ok(plan)
}

/// Run a plan against the index.
pub fn execute<'a>(
    index: &'a dyn Index,
    plan: &LookupPlan,
) -> Result<EntryIter<'a>, SearchError> {
    Ok(index.query(plan.categories, plan.key.as_ref(), plan.rule)?)
}

// ============================================================================
// Filtering
// ============================================================================

/// One accepted entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperTypeMatch {
    pub fact: TypeHierarchyFact,
    pub key: IndexKey,
    pub document: String,
}

/// Lazy decode-and-match over index entries.
pub struct Matches<'a> {
    entries: EntryIter<'a>,
    matcher: PatternMatcher,
    skipped: usize,
}

/// Decode and match `entries` lazily.
pub fn filter(entries: EntryIter<'_>, matcher: PatternMatcher) -> Matches<'_> {
    Matches {
        entries,
        matcher,
        skipped: 0,
    }
}

impl Matches<'_> {
    /// Corrupt entries skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Matches<'_> {
    type Item = SuperTypeMatch;

    fn next(&mut self) -> Option<SuperTypeMatch> {
        for entry in self.entries.by_ref() {
            let fact = match decode(&entry.key) {
                Ok(fact) => fact,
                Err(err) => {
                    self.skipped += 1;
                    tracing::warn!("Skipping entry from {}: {}", entry.document, err);
                    continue;
                }
            };

            if self.matcher.matches(&fact) {
                tracing::trace!("Accepted {} from {}", entry.key, entry.document);
                return Some(SuperTypeMatch {
                    fact,
                    key: entry.key,
                    document: entry.document,
                });
            }
            tracing::trace!("Rejected {} from {}", entry.key, entry.document);
        }
        None
    }
}

// ============================================================================
// Search
// ============================================================================

/// Plan, execute and filter every branch of `pattern`.
///
/// All branches are planned and queried before the first result is produced,
/// so configuration and index errors surface here rather than mid-iteration.
pub fn search<'a>(
    index: &'a dyn Index,
    pattern: &SearchPattern,
    config: &SearchConfig,
) -> Result<SearchResults<'a>, SearchError> {
    let queries = pattern.queries();
    let mut branches = Vec::with_capacity(queries.len());
    for query in &queries {
        let lookup = plan(query, config)?;
        let matcher = PatternMatcher::compile(query)?;
        branches.push(filter(execute(index, &lookup)?, matcher));
    }

    let dedupe = matches!(pattern, SearchPattern::Or(_));
    Ok(SearchResults {
        branches,
        current: 0,
        seen: dedupe.then(HashSet::new),
    })
}

/// Lazy results of [`search`].
///
/// Results from a disjunction are de-duplicated by (key, document).
pub struct SearchResults<'a> {
    branches: Vec<Matches<'a>>,
    current: usize,
    seen: Option<HashSet<(IndexKey, String)>>,
}

impl SearchResults<'_> {
    /// Corrupt entries skipped so far, across all branches.
    pub fn skipped(&self) -> usize {
        self.branches.iter().map(Matches::skipped).sum()
    }
}

impl Iterator for SearchResults<'_> {
    type Item = SuperTypeMatch;

    fn next(&mut self) -> Option<SuperTypeMatch> {
        while let Some(branch) = self.branches.get_mut(self.current) {
            match branch.next() {
                Some(found) => {
                    if let Some(seen) = &mut self.seen {
                        if !seen.insert((found.key.clone(), found.document.clone())) {
                            continue;
                        }
                    }
                    return Some(found);
                }
                None => self.current += 1,
            }
        }
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
