//! Matching decoded facts against query patterns.
//!
//! [`PatternMatcher::compile`] turns a [`QueryPattern`] into a matcher whose
//! glob and regex programs are built once; [`PatternMatcher::matches`] then
//! decides a single decoded fact. A candidate is accepted when:
//!
//! 1. it passes the supertype-kind filter (`OnlySuperClasses` rejects
//!    annotation-type supertypes of named types),
//! 2. its qualification matches the pattern qualification, if both have one,
//! 3. its supertype simple name matches the pattern name.
//!
//! Compiled matchers are immutable and `Send + Sync`.

use globset::{GlobBuilder, GlobMatcher};
use regex::{Regex, RegexBuilder};

use crate::error::SearchError;
use crate::facts::{TypeHierarchyFact, TypeKind};
use crate::pattern::{MatchMode, MatchRule, QueryPattern, SuperRefKind};

// ============================================================================
// Camel Case
// ============================================================================

/// Camel-hump match of `pattern` against `name`.
///
/// Each uppercase or digit character of the pattern starts a hump and may
/// skip the lowercase tail of the current name hump; lowercase pattern
/// characters must match the name verbatim. The first characters must be
/// equal.
///
/// With `same_part_count` the name may not start another uppercase hump after
/// the pattern is consumed (`NPE` matches `NullPointerException` but not
/// `NullPointerExceptionHandler`).
pub fn camel_case_match(pattern: &str, name: &str, same_part_count: bool) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    if pattern.is_empty() {
        return !same_part_count || !name.iter().any(|c| c.is_uppercase());
    }
    if name.first() != pattern.first() {
        return false;
    }

    let mut p = 1;
    let mut n = 1;
    loop {
        if p == pattern.len() {
            return !same_part_count || !name[n..].iter().any(|c| c.is_uppercase());
        }
        if n == name.len() {
            return false;
        }

        let pc = pattern[p];
        if pc == name[n] {
            p += 1;
            n += 1;
            continue;
        }
        if !starts_hump(pc) {
            return false;
        }

        // Skip to the next hump boundary in the name.
        loop {
            if n == name.len() {
                return false;
            }
            let nc = name[n];
            if nc.is_uppercase() {
                if nc != pc {
                    return false;
                }
                break;
            }
            if nc.is_ascii_digit() && nc == pc {
                break;
            }
            n += 1;
        }
        p += 1;
        n += 1;
    }
}

fn starts_hump(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit()
}

// ============================================================================
// Name Matching
// ============================================================================

/// A compiled matcher for one name field.
#[derive(Debug, Clone)]
enum NameMatcher {
    /// No pattern name: everything matches.
    Any,
    Exact { text: String, case_sensitive: bool },
    Prefix { text: String, case_sensitive: bool },
    Camel { text: String, same_part_count: bool },
    Glob(GlobMatcher),
    Regex(Regex),
}

impl NameMatcher {
    fn compile(pattern: Option<&str>, rule: MatchRule) -> Result<Self, SearchError> {
        let Some(text) = pattern else {
            return Ok(NameMatcher::Any);
        };

        if rule.is_camel_case() {
            return Ok(NameMatcher::Camel {
                text: text.to_string(),
                same_part_count: rule.mode == MatchMode::Exact,
            });
        }

        let case_sensitive = rule.case_sensitive;
        match rule.mode {
            MatchMode::Exact => Ok(NameMatcher::Exact {
                text: text.to_string(),
                case_sensitive,
            }),
            MatchMode::Prefix => Ok(NameMatcher::Prefix {
                text: text.to_string(),
                case_sensitive,
            }),
            MatchMode::Glob => compile_glob(text, case_sensitive).map(NameMatcher::Glob),
            MatchMode::Regexp => compile_regex(text, case_sensitive).map(NameMatcher::Regex),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameMatcher::Any => true,
            NameMatcher::Exact {
                text,
                case_sensitive: true,
            } => name == text,
            NameMatcher::Exact { text, .. } => eq_ignore_case(name, text),
            NameMatcher::Prefix {
                text,
                case_sensitive: true,
            } => name.starts_with(text.as_str()),
            NameMatcher::Prefix { text, .. } => starts_with_ignore_case(name, text),
            NameMatcher::Camel {
                text,
                same_part_count,
            } => camel_case_match(text, name, *same_part_count),
            NameMatcher::Glob(glob) => glob.is_match(name),
            NameMatcher::Regex(regex) => regex.is_match(name),
        }
    }
}

/// Compile a whole-name wildcard pattern.
///
/// Only `*` and `?` are wildcards; every other character matches itself.
pub fn compile_glob(pattern: &str, case_sensitive: bool) -> Result<GlobMatcher, SearchError> {
    GlobBuilder::new(&literal_glob(pattern))
        .case_insensitive(!case_sensitive)
        .literal_separator(false)
        .backslash_escape(false)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| SearchError::InvalidPattern {
            pattern: pattern.to_string(),
            mode: MatchMode::Glob,
            message: err.to_string(),
        })
}

/// Wrap glob class and alternation syntax in single-character classes.
fn literal_glob(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '[' | ']' | '{' | '}') {
            out.push('[');
            out.push(c);
            out.push(']');
        } else {
            out.push(c);
        }
    }
    out
}

/// Compile a regular expression anchored at both ends.
pub fn compile_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, SearchError> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|err| SearchError::InvalidPattern {
            pattern: pattern.to_string(),
            mode: MatchMode::Regexp,
            message: err.to_string(),
        })
}

fn fold(c: char) -> impl Iterator<Item = char> {
    c.to_lowercase()
}

fn eq_ignore_case(name: &str, text: &str) -> bool {
    name.chars().flat_map(fold).eq(text.chars().flat_map(fold))
}

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    let mut folded = name.chars().flat_map(fold);
    prefix
        .chars()
        .flat_map(fold)
        .all(|p| folded.next() == Some(p))
}

// ============================================================================
// Pattern Matcher
// ============================================================================

/// A query pattern compiled for repeated matching.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    ref_kind: SuperRefKind,
    qualification: NameMatcher,
    simple_name: NameMatcher,
}

impl PatternMatcher {
    /// Compile `pattern`. Fails only for malformed glob or regex text.
    pub fn compile(pattern: &QueryPattern) -> Result<Self, SearchError> {
        let rule = pattern.rule();
        Ok(PatternMatcher {
            ref_kind: pattern.super_ref_kind(),
            qualification: NameMatcher::compile(pattern.super_qualification(), rule)?,
            simple_name: NameMatcher::compile(pattern.super_simple_name(), rule)?,
        })
    }

    /// Whether `fact` satisfies the compiled pattern.
    pub fn matches(&self, fact: &TypeHierarchyFact) -> bool {
        if self.ref_kind == SuperRefKind::OnlySuperClasses
            && !fact.is_anonymous()
            && fact.super_kind == TypeKind::AnnotationType
        {
            return false;
        }

        if let Some(qualification) = &fact.super_qualification {
            if !self.qualification.matches(qualification) {
                return false;
            }
        }

        self.simple_name.matches(&fact.super_simple_name)
    }
}

/// One-shot match. Compiles `pattern` on every call; use
/// [`PatternMatcher::compile`] when matching many candidates.
pub fn matches(
    pattern: &QueryPattern,
    candidate: &TypeHierarchyFact,
) -> Result<bool, SearchError> {
    Ok(PatternMatcher::compile(pattern)?.matches(candidate))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::SuperTypeEdge;

    fn hit(pattern: &QueryPattern, candidate: &TypeHierarchyFact) -> bool {
        matches(pattern, candidate).unwrap()
    }

    fn fact(super_name: &str) -> TypeHierarchyFact {
        TypeHierarchyFact::from_edge(&SuperTypeEdge::new("Impl", Some(super_name)))
    }

    mod camel {
        use super::*;

        #[test]
        fn humps_match_across_lowercase_runs() {
            assert!(camel_case_match("TRE", "TypedResultException", true));
            assert!(camel_case_match("NPE", "NullPointerException", true));
            assert!(camel_case_match("NuPoEx", "NullPointerException", true));
        }

        #[test]
        fn no_plain_prefix_fallback() {
            assert!(!camel_case_match("TRE", "TreeNode", true));
            assert!(!camel_case_match("TRE", "TreeNode", false));
        }

        #[test]
        fn same_part_count_rejects_extra_humps() {
            assert!(!camel_case_match("NPE", "NullPointerExceptionHandler", true));
            assert!(camel_case_match("NPE", "NullPointerExceptionHandler", false));
        }

        #[test]
        fn first_character_must_be_equal() {
            assert!(!camel_case_match("npe", "NullPointerException", false));
            assert!(!camel_case_match("XPE", "NullPointerException", false));
        }

        #[test]
        fn lowercase_pattern_characters_match_verbatim() {
            assert!(camel_case_match("HashM", "HashMap", true));
            assert!(!camel_case_match("Hasx", "HashMap", false));
        }

        #[test]
        fn digits_start_humps() {
            assert!(camel_case_match("U16T", "Utf16To2", true));
            assert!(!camel_case_match("U2", "Utf16To2", false));
            assert!(camel_case_match("B2", "Base2", true));
        }
    }

    mod names {
        use super::*;

        fn query(name: &str, rule: MatchRule) -> QueryPattern {
            QueryPattern::super_type(name).with_rule(rule)
        }

        #[test]
        fn exact_is_case_sensitive_by_default() {
            assert!(hit(&query("Base", MatchRule::exact()), &fact("Base")));
            assert!(!hit(&query("base", MatchRule::exact()), &fact("Base")));
            assert!(hit(
                &query("base", MatchRule::exact().case_insensitive()),
                &fact("Base")
            ));
        }

        #[test]
        fn prefix_matches_leading_text() {
            assert!(hit(&query("Ba", MatchRule::prefix()), &fact("Base")));
            assert!(!hit(&query("ba", MatchRule::prefix()), &fact("Base")));
            assert!(hit(
                &query("BA", MatchRule::prefix().case_insensitive()),
                &fact("Base")
            ));
        }

        #[test]
        fn glob_covers_whole_name() {
            assert!(hit(&query("*Listener", MatchRule::glob()), &fact("ActionListener")));
            assert!(hit(&query("Ba?e", MatchRule::glob()), &fact("Base")));
            assert!(!hit(&query("Ba", MatchRule::glob()), &fact("Base")));
            assert!(hit(
                &query("*listener", MatchRule::glob().case_insensitive()),
                &fact("ActionListener")
            ));
        }

        #[test]
        fn glob_brackets_and_braces_are_literal() {
            assert!(hit(&query("List[*]", MatchRule::glob()), &fact("List[]")));
            assert!(hit(&query("[", MatchRule::glob()), &fact("[")));
            assert!(!hit(&query("[AB]ase", MatchRule::glob()), &fact("Base")));
            assert!(hit(&query("{A,B}*", MatchRule::glob()), &fact("{A,B}Impl")));
            assert!(!hit(&query("{A,B}*", MatchRule::glob()), &fact("AImpl")));
        }

        #[test]
        fn regexp_is_anchored() {
            assert!(hit(&query("Ba.e", MatchRule::regexp()), &fact("Base")));
            assert!(!hit(&query("as", MatchRule::regexp()), &fact("Base")));
            assert!(hit(&query("a|Base", MatchRule::regexp()), &fact("Base")));
            assert!(hit(
                &query("BASE", MatchRule::regexp().case_insensitive()),
                &fact("Base")
            ));
        }

        #[test]
        fn camel_rule_uses_humps() {
            let exact = MatchRule::exact().camel_case();
            assert!(hit(&query("TRE", exact), &fact("TypedResultException")));
            assert!(!hit(&query("TRE", exact), &fact("TreeNode")));
            let prefix = MatchRule::prefix().camel_case();
            assert!(hit(&query("TR", prefix), &fact("TypedResultException")));
        }

        #[test]
        fn invalid_patterns_fail_to_compile() {
            let bad_regex = query("(", MatchRule::regexp());
            assert!(matches!(
                PatternMatcher::compile(&bad_regex),
                Err(SearchError::InvalidPattern {
                    mode: MatchMode::Regexp,
                    ..
                })
            ));
            assert!(matches(&bad_regex, &fact("Base")).is_err());
        }

        #[test]
        fn missing_name_matches_everything() {
            assert!(hit(&QueryPattern::any(), &fact("Anything")));
        }
    }

    mod filters {
        use super::*;

        #[test]
        fn qualification_checked_only_when_candidate_has_one() {
            let pattern = QueryPattern::super_type("Base").with_qualification("lib");
            assert!(hit(&pattern, &fact("lib.Base")));
            assert!(!hit(&pattern, &fact("other.Base")));
            assert!(hit(&pattern, &fact("Base")));
        }

        #[test]
        fn class_only_rejects_annotation_supertypes_of_named_types() {
            let pattern =
                QueryPattern::super_type("Marker").with_ref_kind(SuperRefKind::OnlySuperClasses);
            let annotation = TypeHierarchyFact::from_edge(
                &SuperTypeEdge::new("Impl", Some("Marker")).with_super_kind(TypeKind::AnnotationType),
            );
            assert!(!hit(&pattern, &annotation));

            let anonymous = TypeHierarchyFact::from_edge(
                &SuperTypeEdge::new("", Some("Marker"))
                    .anonymous()
                    .with_super_kind(TypeKind::AnnotationType),
            );
            assert!(hit(&pattern, &anonymous));

            let enumeration = TypeHierarchyFact::from_edge(
                &SuperTypeEdge::new("Impl", Some("Marker")).with_super_kind(TypeKind::Enum),
            );
            assert!(hit(&pattern, &enumeration));
        }

        #[test]
        fn interface_only_does_not_filter_kinds() {
            let pattern =
                QueryPattern::super_type("Base").with_ref_kind(SuperRefKind::OnlySuperInterfaces);
            assert!(hit(&pattern, &fact("Base")));
        }

        #[test]
        fn nested_supertype_found_by_simple_name() {
            let pattern = QueryPattern::super_type("Inner").with_qualification("p.Outer$");
            assert!(hit(&pattern, &fact("p.Outer$Inner")));
        }
    }

    #[test]
    fn matcher_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternMatcher>();
    }
}
