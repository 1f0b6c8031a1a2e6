//! Supertype-reference index keys.
//!
//! A key packs one [`TypeHierarchyFact`] into a flat sequence of UTF-16 code
//! units. Six separators delimit the variable-width fields; three fixed-width
//! units follow the last separator:
//!
//! ```text
//! superSimpleName / superQualification / simpleName / enclosingTypeName /
//! typeParameters / namespace / superKind kind modifiers
//! ```
//!
//! ## Field Encoding
//!
//! | Field | Empty | `0` token | Otherwise |
//! |-------|-------|-----------|-----------|
//! | `superQualification` | `None` | - | literal |
//! | `enclosingTypeName` | `None` | anonymous type | `$`-joined names |
//! | `typeParameters` | `None` | - | `,`-joined signatures |
//! | `namespace` | `None` | same as `superQualification` | `$`-joined segments |
//!
//! Keys always carry a separator right after `superSimpleName`, which is what
//! lets an exact-name lookup run as a prefix lookup on `name/`.
//!
//! The modifiers occupy one code unit, so the full `u16` range is
//! representable. The trailing units are read by offset and never scanned for
//! separators: a modifiers value of `0x2F` is not a separator.

use std::fmt;

use crate::error::SearchError;
use crate::facts::{
    join, EnclosingType, NamespacePath, SuperTypeEdge, TypeHierarchyFact, TypeKind,
    NESTED_SEPARATOR,
};

/// Field separator. Never part of any field content.
pub const SEPARATOR: char = '/';

/// One-unit back-reference token (anonymous enclosing type, namespace equal
/// to the supertype qualification).
pub const ZERO_CHAR: char = '0';

/// Separator between type-parameter signatures.
pub const PARAMETER_SEPARATOR: char = ',';

const SEP: u16 = SEPARATOR as u16;
const ZERO: u16 = ZERO_CHAR as u16;
const TRAILING_UNITS: usize = 3;

// ============================================================================
// IndexKey
// ============================================================================

/// An opaque index key: a sequence of UTF-16 code units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey(Vec<u16>);

impl IndexKey {
    /// Wrap raw code units.
    pub fn from_units(units: Vec<u16>) -> Self {
        IndexKey(units)
    }

    /// The lookup key for "every entry whose first field is exactly `word`".
    pub fn word_prefix(word: &str) -> Self {
        let mut units: Vec<u16> = word.encode_utf16().collect();
        units.push(SEP);
        IndexKey(units)
    }

    pub fn units(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &IndexKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Prefix test with Unicode case folding.
    pub fn starts_with_ignore_case(&self, prefix: &IndexKey) -> bool {
        let mut chars = self.chars();
        prefix
            .chars()
            .all(|p| chars.next().is_some_and(|c| c.to_lowercase().eq(p.to_lowercase())))
    }

    /// Equality with Unicode case folding.
    pub fn eq_ignore_case(&self, other: &IndexKey) -> bool {
        self.len() == other.len() && self.starts_with_ignore_case(other)
    }

    /// Text before the first separator (the whole key if there is none).
    pub fn leading_word(&self) -> String {
        let end = self.0.iter().position(|&u| u == SEP).unwrap_or(self.0.len());
        String::from_utf16_lossy(&self.0[..end])
    }

    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        char::decode_utf16(self.0.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

impl From<&str> for IndexKey {
    fn from(text: &str) -> Self {
        IndexKey(text.encode_utf16().collect())
    }
}

/// Printable form: graphic characters as-is, everything else as `\u{..}`.
impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decoded in char::decode_utf16(self.0.iter().copied()) {
            match decoded {
                Ok(c) if !c.is_control() && c != '\\' => write!(f, "{c}")?,
                Ok(c) => write!(f, "\\u{{{:04x}}}", c as u32)?,
                Err(err) => write!(f, "\\u{{{:04x}}}", err.unpaired_surrogate())?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a fact into its index key.
pub fn encode(fact: &TypeHierarchyFact) -> IndexKey {
    let mut units = Vec::with_capacity(estimated_len(fact));

    push_str(&mut units, &fact.super_simple_name);
    units.push(SEP);

    if let Some(qualification) = &fact.super_qualification {
        push_str(&mut units, qualification);
    }
    units.push(SEP);

    push_str(&mut units, &fact.simple_name);
    units.push(SEP);

    match &fact.enclosing_type_name {
        Some(EnclosingType::Named(names)) => push_str(&mut units, names),
        Some(EnclosingType::Anonymous) => units.push(ZERO),
        None => {}
    }
    units.push(SEP);

    if let Some(signatures) = &fact.type_parameter_signatures {
        push_str(&mut units, &join(signatures, PARAMETER_SEPARATOR));
    }
    units.push(SEP);

    if namespace_is_back_reference(fact) {
        units.push(ZERO);
    } else if let Some(NamespacePath::Segments(segments)) = &fact.namespace_path {
        push_str(&mut units, &join(segments, NESTED_SEPARATOR));
    }
    units.push(SEP);

    units.push(fact.super_kind.tag() as u16);
    units.push(fact.kind.tag() as u16);
    units.push(fact.modifiers);

    IndexKey(units)
}

/// Normalize a model-layer edge and encode it.
pub fn encode_edge(edge: &SuperTypeEdge) -> IndexKey {
    encode(&TypeHierarchyFact::from_edge(edge))
}

/// Whether the namespace field is written as the `0` back-reference.
fn namespace_is_back_reference(fact: &TypeHierarchyFact) -> bool {
    match (&fact.namespace_path, &fact.super_qualification) {
        (Some(NamespacePath::SameAsSuperQualification), _) => true,
        (Some(NamespacePath::Segments(segments)), Some(qualification)) => {
            !qualification.is_empty() && join(segments, NESTED_SEPARATOR) == *qualification
        }
        _ => false,
    }
}

fn push_str(units: &mut Vec<u16>, text: &str) {
    units.extend(text.encode_utf16());
}

fn estimated_len(fact: &TypeHierarchyFact) -> usize {
    fact.super_simple_name.len()
        + fact.super_qualification.as_ref().map_or(0, String::len)
        + fact.simple_name.len()
        + 6
        + TRAILING_UNITS
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a key produced by [`encode`].
///
/// Fields are read strictly left to right; the three trailing units are read
/// by offset from the sixth separator and must be exactly three.
pub fn decode(key: &IndexKey) -> Result<TypeHierarchyFact, SearchError> {
    let mut reader = FieldReader::new(key);

    let super_simple_name = reader.text("super simple name")?;
    let super_qualification = Some(reader.text("super qualification")?).filter(|q| !q.is_empty());
    let simple_name = reader.text("simple name")?;

    let enclosing_type_name = match reader.field("enclosing type name")? {
        [] => None,
        [ZERO] => Some(EnclosingType::Anonymous),
        units => Some(EnclosingType::Named(reader.decode_text(units)?)),
    };

    let type_parameter_signatures = match reader.field("type parameters")? {
        [] => None,
        units => Some(
            reader
                .decode_text(units)?
                .split(PARAMETER_SEPARATOR)
                .map(str::to_string)
                .collect(),
        ),
    };

    let namespace_path = match reader.field("namespace")? {
        [] => None,
        [ZERO] => Some(NamespacePath::SameAsSuperQualification),
        units => Some(NamespacePath::Segments(
            reader
                .decode_text(units)?
                .split(NESTED_SEPARATOR)
                .map(str::to_string)
                .collect(),
        )),
    };

    let &[super_kind, kind, modifiers] = reader.rest() else {
        return Err(SearchError::corrupt_key(
            key,
            format!(
                "expected {} trailing units after namespace field, found {}",
                TRAILING_UNITS,
                reader.rest().len()
            ),
        ));
    };

    Ok(TypeHierarchyFact {
        super_simple_name,
        super_qualification,
        simple_name,
        enclosing_type_name,
        type_parameter_signatures,
        namespace_path,
        super_kind: kind_tag(key, super_kind, "super kind")?,
        kind: kind_tag(key, kind, "kind")?,
        modifiers,
    })
}

fn kind_tag(key: &IndexKey, unit: u16, field: &str) -> Result<TypeKind, SearchError> {
    TypeKind::from_tag(unit).ok_or_else(|| {
        SearchError::corrupt_key(key, format!("unknown {field} tag \\u{{{unit:04x}}}"))
    })
}

/// Sequential separator-delimited reader over a key.
struct FieldReader<'k> {
    key: &'k IndexKey,
    pos: usize,
}

impl<'k> FieldReader<'k> {
    fn new(key: &'k IndexKey) -> Self {
        FieldReader { key, pos: 0 }
    }

    /// Units up to the next separator; consumes the separator.
    fn field(&mut self, name: &str) -> Result<&'k [u16], SearchError> {
        let rest = &self.key.units()[self.pos..];
        match rest.iter().position(|&u| u == SEP) {
            Some(offset) => {
                self.pos += offset + 1;
                Ok(&rest[..offset])
            }
            None => Err(SearchError::corrupt_key(
                self.key,
                format!("missing separator after {name}"),
            )),
        }
    }

    fn text(&mut self, name: &str) -> Result<String, SearchError> {
        let units = self.field(name)?;
        self.decode_text(units)
    }

    fn decode_text(&self, units: &[u16]) -> Result<String, SearchError> {
        String::from_utf16(units)
            .map_err(|_| SearchError::corrupt_key(self.key, "field is not valid UTF-16"))
    }

    fn rest(&self) -> &'k [u16] {
        &self.key.units()[self.pos..]
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(super_name: &str) -> TypeHierarchyFact {
        TypeHierarchyFact::from_edge(&SuperTypeEdge::new("Impl", Some(super_name)))
    }

    mod layout {
        use super::*;

        #[test]
        fn minimal_key_layout() {
            let key = encode(&fact("Base"));
            let mut expected: Vec<u16> = "Base//Impl////".encode_utf16().collect();
            expected.extend(['C' as u16, 'C' as u16, 0]);
            assert_eq!(key.units(), expected.as_slice());
        }

        #[test]
        fn full_key_layout() {
            let edge = SuperTypeEdge::new("Impl", Some("lib.Base"))
                .with_namespace(["app", "core"])
                .with_enclosing(["Outer"])
                .with_type_parameters(["T", "U"])
                .with_kind(TypeKind::Interface)
                .with_super_kind(TypeKind::Interface)
                .with_modifiers(9);
            let key = encode_edge(&edge);
            assert_eq!(key.to_string(), "Base/lib/Impl/Outer/T,U/app$core/II\\u{0009}");
        }

        #[test]
        fn anonymous_enclosing_uses_zero_token() {
            let key = encode_edge(&SuperTypeEdge::new("", Some("Base")).anonymous());
            assert!(key.to_string().starts_with("Base///0///"));
        }

        #[test]
        fn namespace_equal_to_qualification_is_back_referenced() {
            let key = encode_edge(&SuperTypeEdge::new("Impl", Some("pkg.Base")).with_namespace(["pkg"]));
            assert!(key.to_string().starts_with("Base/pkg/Impl///0/"));
        }

        #[test]
        fn every_key_has_separator_after_super_simple_name() {
            for name in ["Foo", "a.Foo", "a.Outer$Foo"] {
                assert!(encode(&fact(name)).starts_with(&IndexKey::word_prefix("Foo")));
            }
        }
    }

    mod roundtrip {
        use super::*;

        #[test]
        fn decode_inverts_encode() {
            let edge = SuperTypeEdge::new("Impl", Some("lib.Base"))
                .with_namespace(["app"])
                .with_enclosing(["A", "B"])
                .with_type_parameters(["TK;", "TV;"])
                .with_super_kind(TypeKind::Interface)
                .with_modifiers(0x0401);
            let original = TypeHierarchyFact::from_edge(&edge);
            assert_eq!(decode(&encode(&original)).unwrap(), original);
        }

        #[test]
        fn back_reference_resolves_to_original_namespace() {
            let edge = SuperTypeEdge::new("Impl", Some("pkg.Base")).with_namespace(["pkg"]);
            let original = TypeHierarchyFact::from_edge(&edge);
            let decoded = decode(&encode(&original)).unwrap();
            assert_eq!(decoded.namespace_path, Some(NamespacePath::SameAsSuperQualification));
            assert_eq!(decoded.resolved_namespace_path(), Some(vec!["pkg".to_string()]));
            assert_eq!(decoded.resolved(), original);
        }

        #[test]
        fn anonymous_and_absent_enclosing_are_distinct() {
            let anonymous = decode(&encode_edge(&SuperTypeEdge::new("", Some("B")).anonymous())).unwrap();
            let top_level = decode(&encode_edge(&SuperTypeEdge::new("X", Some("B")))).unwrap();
            assert_eq!(anonymous.enclosing_type_name, Some(EnclosingType::Anonymous));
            assert_eq!(top_level.enclosing_type_name, None);
        }

        #[test]
        fn modifiers_survive_separator_and_surrogate_values() {
            for modifiers in [0x002F, 0xD800, 0xFFFF] {
                let original = TypeHierarchyFact {
                    modifiers,
                    ..fact("Base")
                };
                assert_eq!(decode(&encode(&original)).unwrap().modifiers, modifiers);
            }
        }

        #[test]
        fn base_object_roundtrips() {
            let original = TypeHierarchyFact::from_edge(&SuperTypeEdge::new("Foo", None));
            let decoded = decode(&encode(&original)).unwrap();
            assert_eq!(decoded.super_simple_name, "(base object)");
            assert_eq!(decoded, original);
        }
    }

    mod corrupt {
        use super::*;

        fn assert_corrupt(key: IndexKey) {
            match decode(&key) {
                Err(SearchError::CorruptIndexKey { .. }) => {}
                other => panic!("expected CorruptIndexKey, got {other:?}"),
            }
        }

        #[test]
        fn too_few_separators() {
            assert_corrupt(IndexKey::from("Base/pkg/Impl"));
            assert_corrupt(IndexKey::from(""));
        }

        #[test]
        fn missing_trailing_tags() {
            assert_corrupt(IndexKey::from("Base//Impl////"));
            assert_corrupt(IndexKey::from("Base//Impl////CC"));
        }

        #[test]
        fn extra_trailing_units() {
            let mut units = encode(&fact("Base")).units().to_vec();
            units.push(0);
            assert_corrupt(IndexKey::from_units(units));
        }

        #[test]
        fn unknown_kind_tag() {
            let mut units: Vec<u16> = "Base//Impl////".encode_utf16().collect();
            units.extend(['C' as u16, 'Q' as u16, 0]);
            assert_corrupt(IndexKey::from_units(units));
        }

        #[test]
        fn unpaired_surrogate_in_field() {
            let mut units = vec![0xD800];
            units.extend(encode(&fact("Base")).units());
            assert_corrupt(IndexKey::from_units(units));
        }
    }

    mod key_ops {
        use super::*;

        #[test]
        fn display_escapes_control_units() {
            let key = IndexKey::from_units(vec!['A' as u16, 1, 0xDC00]);
            assert_eq!(key.to_string(), "A\\u{0001}\\u{dc00}");
        }

        #[test]
        fn case_insensitive_prefix() {
            let key = IndexKey::from("FooBar/x");
            assert!(key.starts_with_ignore_case(&IndexKey::from("foobar/")));
            assert!(!key.starts_with_ignore_case(&IndexKey::from("foobaz")));
            assert!(!IndexKey::from("Fo").starts_with_ignore_case(&IndexKey::from("foo")));
            assert!(key.eq_ignore_case(&IndexKey::from("FOOBAR/X")));
        }

        #[test]
        fn leading_word_stops_at_separator() {
            assert_eq!(IndexKey::from("Foo/bar").leading_word(), "Foo");
            assert_eq!(IndexKey::from("Foo").leading_word(), "Foo");
        }
    }
}
