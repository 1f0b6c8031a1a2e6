//! Query patterns.
//!
//! A [`QueryPattern`] asks for the supertype-reference entries whose
//! supertype matches a name under an explicit [`MatchRule`]. Patterns are
//! immutable once built and carry their rule with them; nothing about
//! matching is read from global state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::index::{Category, SUPER_REF};

/// Categories a supertype-reference query reads.
pub const CATEGORIES: &[Category] = &[SUPER_REF];

// ============================================================================
// Match Rules
// ============================================================================

/// How a pattern name is compared against a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    Prefix,
    /// `*` and `?` wildcards over the whole name.
    Glob,
    /// Anchored regular expression over the whole name.
    Regexp,
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchMode::Exact => write!(f, "exact"),
            MatchMode::Prefix => write!(f, "prefix"),
            MatchMode::Glob => write!(f, "glob"),
            MatchMode::Regexp => write!(f, "regexp"),
        }
    }
}

/// A match mode plus its case and camel-case modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRule {
    pub mode: MatchMode,
    pub case_sensitive: bool,
    /// Camel-hump matching; only meaningful for `Exact` and `Prefix`.
    pub camel_case: bool,
}

impl Default for MatchRule {
    fn default() -> Self {
        MatchRule::exact()
    }
}

impl MatchRule {
    pub fn new(mode: MatchMode) -> Self {
        MatchRule {
            mode,
            case_sensitive: true,
            camel_case: false,
        }
    }

    pub fn exact() -> Self {
        MatchRule::new(MatchMode::Exact)
    }

    pub fn prefix() -> Self {
        MatchRule::new(MatchMode::Prefix)
    }

    pub fn glob() -> Self {
        MatchRule::new(MatchMode::Glob)
    }

    pub fn regexp() -> Self {
        MatchRule::new(MatchMode::Regexp)
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn case_insensitive(self) -> Self {
        self.with_case_sensitive(false)
    }

    pub fn with_camel_case(mut self, camel_case: bool) -> Self {
        self.camel_case = camel_case;
        self
    }

    pub fn camel_case(self) -> Self {
        self.with_camel_case(true)
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Whether camel-hump matching applies to this rule.
    pub fn is_camel_case(&self) -> bool {
        self.camel_case && matches!(self.mode, MatchMode::Exact | MatchMode::Prefix)
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} match", self.mode)?;
        if self.is_camel_case() {
            write!(f, ", camel case")?;
        }
        if self.case_sensitive {
            write!(f, ", case sensitive")
        } else {
            write!(f, ", case insensitive")
        }
    }
}

// ============================================================================
// Supertype Reference Patterns
// ============================================================================

/// Which supertype edges a query is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperRefKind {
    #[default]
    AllSuperTypes,
    OnlySuperInterfaces,
    OnlySuperClasses,
}

impl SuperRefKind {
    fn pattern_name(self) -> &'static str {
        match self {
            SuperRefKind::AllSuperTypes => "SuperTypeReferencePattern",
            SuperRefKind::OnlySuperInterfaces => "SuperInterfaceReferencePattern",
            SuperRefKind::OnlySuperClasses => "SuperClassReferencePattern",
        }
    }
}

/// A query for supertype-reference entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryPattern {
    super_qualification: Option<String>,
    super_simple_name: Option<String>,
    super_ref_kind: SuperRefKind,
    rule: MatchRule,
}

impl QueryPattern {
    /// Match every supertype reference.
    pub fn any() -> Self {
        QueryPattern::default()
    }

    /// Match supertypes named `simple_name` under an exact, case-sensitive rule.
    pub fn super_type(simple_name: impl Into<String>) -> Self {
        QueryPattern {
            super_simple_name: Some(simple_name.into()),
            ..QueryPattern::default()
        }
    }

    pub fn with_qualification(mut self, qualification: impl Into<String>) -> Self {
        self.super_qualification = Some(qualification.into());
        self
    }

    pub fn with_ref_kind(mut self, kind: SuperRefKind) -> Self {
        self.super_ref_kind = kind;
        self
    }

    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn super_qualification(&self) -> Option<&str> {
        self.super_qualification.as_deref()
    }

    pub fn super_simple_name(&self) -> Option<&str> {
        self.super_simple_name.as_deref()
    }

    pub fn super_ref_kind(&self) -> SuperRefKind {
        self.super_ref_kind
    }

    pub fn rule(&self) -> MatchRule {
        self.rule
    }

    /// Index categories this pattern reads.
    pub fn categories(&self) -> &'static [Category] {
        CATEGORIES
    }
}

impl fmt::Display for QueryPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: <", self.super_ref_kind.pattern_name())?;
        match (&self.super_qualification, &self.super_simple_name) {
            (Some(q), Some(name)) => write!(f, "{q}.{name}")?,
            (Some(q), None) => write!(f, "{q}.*")?,
            (None, Some(name)) => write!(f, "{name}")?,
            (None, None) => write!(f, "*")?,
        }
        write!(f, ">, {}", self.rule)
    }
}

// ============================================================================
// Search Patterns
// ============================================================================

/// The pattern shapes the planner accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPattern {
    SuperType(QueryPattern),
    /// Disjunction: each branch is planned on its own.
    Or(Vec<SearchPattern>),
}

impl SearchPattern {
    /// Combine two patterns into a disjunction, flattening nested `Or`s.
    pub fn or(self, other: SearchPattern) -> SearchPattern {
        let mut branches = match self {
            SearchPattern::Or(branches) => branches,
            single => vec![single],
        };
        match other {
            SearchPattern::Or(more) => branches.extend(more),
            single => branches.push(single),
        }
        SearchPattern::Or(branches)
    }

    /// Every leaf query, depth first.
    pub fn queries(&self) -> Vec<&QueryPattern> {
        let mut out = Vec::new();
        self.collect_queries(&mut out);
        out
    }

    fn collect_queries<'a>(&'a self, out: &mut Vec<&'a QueryPattern>) {
        match self {
            SearchPattern::SuperType(query) => out.push(query),
            SearchPattern::Or(branches) => {
                for branch in branches {
                    branch.collect_queries(out);
                }
            }
        }
    }
}

impl From<QueryPattern> for SearchPattern {
    fn from(query: QueryPattern) -> Self {
        SearchPattern::SuperType(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_follow_ref_kind() {
        let pattern = QueryPattern::super_type("Foo");
        assert_eq!(
            pattern.to_string(),
            "SuperTypeReferencePattern: <Foo>, exact match, case sensitive"
        );

        let pattern = QueryPattern::super_type("List")
            .with_qualification("java.util")
            .with_ref_kind(SuperRefKind::OnlySuperInterfaces)
            .with_rule(MatchRule::prefix().case_insensitive());
        assert_eq!(
            pattern.to_string(),
            "SuperInterfaceReferencePattern: <java.util.List>, prefix match, case insensitive"
        );

        let pattern = QueryPattern::any()
            .with_ref_kind(SuperRefKind::OnlySuperClasses)
            .with_rule(MatchRule::exact().camel_case());
        assert_eq!(
            pattern.to_string(),
            "SuperClassReferencePattern: <*>, exact match, camel case, case sensitive"
        );
    }

    #[test]
    fn camel_case_only_applies_to_exact_and_prefix() {
        assert!(MatchRule::exact().camel_case().is_camel_case());
        assert!(MatchRule::prefix().camel_case().is_camel_case());
        assert!(!MatchRule::glob().camel_case().is_camel_case());
        assert!(!MatchRule::regexp().camel_case().is_camel_case());
    }

    #[test]
    fn or_flattens_and_collects_leaves() {
        let a = SearchPattern::from(QueryPattern::super_type("A"));
        let b = SearchPattern::from(QueryPattern::super_type("B"));
        let c = SearchPattern::from(QueryPattern::super_type("C"));
        let combined = a.or(b).or(c);

        let SearchPattern::Or(branches) = &combined else {
            panic!("expected Or");
        };
        assert_eq!(branches.len(), 3);

        let names: Vec<_> = combined
            .queries()
            .iter()
            .filter_map(|q| q.super_simple_name())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn pattern_deserializes_with_defaults() {
        let json = r#"{"super_simple_name":"Foo"}"#;
        let pattern: QueryPattern = serde_json::from_str(json).unwrap();
        assert_eq!(pattern, QueryPattern::super_type("Foo"));
    }
}
