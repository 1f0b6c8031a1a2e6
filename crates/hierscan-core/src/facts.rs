//! Type-hierarchy facts: one record per (type, supertype) edge.
//!
//! The model layer hands over [`SuperTypeEdge`] values exactly as it sees
//! them in source: a possibly qualified supertype name, the chain of
//! enclosing types, the declaring namespace. [`TypeHierarchyFact::from_edge`]
//! normalizes an edge into the record shape stored in the index:
//!
//! | Edge input | Fact field |
//! |------------|------------|
//! | `super_type_name = None` | `super_simple_name = "(base object)"` |
//! | `"p.A"` | `super_qualification = "p"`, `super_simple_name = "A"` |
//! | `"p.Outer$Inner"` | `super_qualification = "p.Outer$"`, `super_simple_name = "Inner"` |
//! | `enclosing_type_names = ["A", "B"]` | `enclosing_type_name = Named("A$B")` |
//! | `anonymous = true` | `enclosing_type_name = Anonymous` |
//!
//! Splitting nested supertype names this way lets a lookup by simple name
//! find both top-level and nested declarations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal recorded when a type has no explicit supertype.
pub const BASE_OBJECT_NAME: &str = "(base object)";

/// Separator between namespace segments of a qualified name.
pub const NAMESPACE_SEPARATOR: char = '.';

/// Separator between nested type names (compiled inner-class notation).
pub const NESTED_SEPARATOR: char = '$';

// ============================================================================
// Kinds
// ============================================================================

/// Declaration kind of a type, stored as a single tag character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
    AnnotationType,
}

impl TypeKind {
    /// Tag character used in index keys.
    pub fn tag(self) -> char {
        match self {
            TypeKind::Class => 'C',
            TypeKind::Interface => 'I',
            TypeKind::Enum => 'E',
            TypeKind::AnnotationType => 'A',
        }
    }

    /// Parse a tag unit read back from an index key.
    pub fn from_tag(unit: u16) -> Option<Self> {
        match char::from_u32(u32::from(unit))? {
            'C' => Some(TypeKind::Class),
            'I' => Some(TypeKind::Interface),
            'E' => Some(TypeKind::Enum),
            'A' => Some(TypeKind::AnnotationType),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeKind::Class => write!(f, "class"),
            TypeKind::Interface => write!(f, "interface"),
            TypeKind::Enum => write!(f, "enum"),
            TypeKind::AnnotationType => write!(f, "annotation_type"),
        }
    }
}

/// Lexically enclosing type of the declaring type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnclosingType {
    /// Enclosing type names joined with `$`.
    Named(String),
    /// The declaring type is anonymous.
    Anonymous,
}

/// Namespace of the declaring type as recorded in the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespacePath {
    /// Literal namespace segments.
    Segments(Vec<String>),
    /// The namespace equals the supertype qualification and was stored as a
    /// back-reference.
    SameAsSuperQualification,
}

// ============================================================================
// Edge (model-layer input)
// ============================================================================

/// One supertype edge as supplied by the model layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperTypeEdge {
    /// Modifier flags of the declaring type.
    #[serde(default)]
    pub modifiers: u16,
    /// Namespace path of the declaring type, if known.
    #[serde(default)]
    pub namespace: Option<Vec<String>>,
    /// Name of the declaring type; only the last `.` segment is kept.
    pub type_name: String,
    /// Lexically enclosing types, outermost first.
    #[serde(default)]
    pub enclosing_type_names: Vec<String>,
    /// Whether the declaring type is anonymous.
    #[serde(default)]
    pub anonymous: bool,
    /// Generic parameter signatures, if known.
    #[serde(default)]
    pub type_parameter_signatures: Option<Vec<String>>,
    /// Kind of the declaring type.
    #[serde(default)]
    pub kind: TypeKind,
    /// Supertype name, possibly qualified. `None` means the implicit root type.
    #[serde(default)]
    pub super_type_name: Option<String>,
    /// Kind of the supertype.
    #[serde(default)]
    pub super_kind: TypeKind,
}

impl SuperTypeEdge {
    /// Create an edge from `type_name` to `super_type_name`.
    pub fn new(type_name: impl Into<String>, super_type_name: Option<&str>) -> Self {
        SuperTypeEdge {
            modifiers: 0,
            namespace: None,
            type_name: type_name.into(),
            enclosing_type_names: Vec::new(),
            anonymous: false,
            type_parameter_signatures: None,
            kind: TypeKind::Class,
            super_type_name: super_type_name.map(str::to_string),
            super_kind: TypeKind::Class,
        }
    }

    pub fn with_namespace<S: Into<String>>(mut self, segments: impl IntoIterator<Item = S>) -> Self {
        self.namespace = Some(segments.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_enclosing<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.enclosing_type_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn with_type_parameters<S: Into<String>>(
        mut self,
        signatures: impl IntoIterator<Item = S>,
    ) -> Self {
        self.type_parameter_signatures = Some(signatures.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_super_kind(mut self, super_kind: TypeKind) -> Self {
        self.super_kind = super_kind;
        self
    }

    pub fn with_modifiers(mut self, modifiers: u16) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check that every field survives an index-key round trip.
    ///
    /// Rejects the key separator `/` anywhere, `,` inside a type-parameter
    /// signature, `$` inside a namespace segment, and enclosing or namespace
    /// values spelled exactly `0` (the back-reference token).
    pub fn validate(&self) -> Result<(), ReservedValue> {
        reject_separator("type_name", &self.type_name)?;
        if let Some(super_type_name) = &self.super_type_name {
            reject_separator("super_type_name", super_type_name)?;
        }

        for name in &self.enclosing_type_names {
            reject_separator("enclosing_type_names", name)?;
        }
        if !self.anonymous {
            let joined = join(&self.enclosing_type_names, NESTED_SEPARATOR);
            reject_token("enclosing_type_names", &joined)?;
        }

        for signature in self.type_parameter_signatures.iter().flatten() {
            reject_separator("type_parameter_signatures", signature)?;
            if signature.contains(',') {
                return Err(ReservedValue::new(
                    "type_parameter_signatures",
                    signature,
                    "contains the parameter separator ','",
                ));
            }
        }

        if let Some(segments) = &self.namespace {
            for segment in segments {
                reject_separator("namespace", segment)?;
                if segment.contains(NESTED_SEPARATOR) {
                    return Err(ReservedValue::new(
                        "namespace",
                        segment,
                        "contains the segment separator '$'",
                    ));
                }
            }
            reject_token("namespace", &join(segments, NESTED_SEPARATOR))?;
        }
        Ok(())
    }
}

/// An edge field value that the index key layout cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` value {value:?} {reason}")]
pub struct ReservedValue {
    pub field: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl ReservedValue {
    fn new(field: &'static str, value: &str, reason: &'static str) -> Self {
        ReservedValue {
            field,
            value: value.to_string(),
            reason,
        }
    }
}

fn reject_separator(field: &'static str, value: &str) -> Result<(), ReservedValue> {
    if value.contains('/') {
        return Err(ReservedValue::new(field, value, "contains the key separator '/'"));
    }
    Ok(())
}

fn reject_token(field: &'static str, value: &str) -> Result<(), ReservedValue> {
    if value == "0" {
        return Err(ReservedValue::new(field, value, "is the back-reference token"));
    }
    Ok(())
}

// ============================================================================
// Fact
// ============================================================================

/// A normalized supertype-reference record, as encoded into and decoded from
/// the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeHierarchyFact {
    pub super_simple_name: String,
    pub super_qualification: Option<String>,
    pub simple_name: String,
    pub enclosing_type_name: Option<EnclosingType>,
    pub type_parameter_signatures: Option<Vec<String>>,
    pub namespace_path: Option<NamespacePath>,
    pub super_kind: TypeKind,
    pub kind: TypeKind,
    pub modifiers: u16,
}

impl TypeHierarchyFact {
    /// Normalize a model-layer edge into an indexable fact.
    ///
    /// Empty collections collapse to `None`: an empty enclosing chain, an
    /// empty type-parameter list and an empty namespace are all stored as
    /// empty key fields and cannot be told apart from "unknown".
    pub fn from_edge(edge: &SuperTypeEdge) -> Self {
        let super_type_name = edge.super_type_name.as_deref().unwrap_or(BASE_OBJECT_NAME);
        let (super_qualification, super_simple_name) = split_super_type_name(super_type_name);

        let simple_name = edge
            .type_name
            .rsplit(NAMESPACE_SEPARATOR)
            .next()
            .unwrap_or_default()
            .to_string();

        let enclosing_type_name = if edge.anonymous {
            Some(EnclosingType::Anonymous)
        } else {
            let joined = join(&edge.enclosing_type_names, NESTED_SEPARATOR);
            (!joined.is_empty()).then_some(EnclosingType::Named(joined))
        };

        let type_parameter_signatures = edge
            .type_parameter_signatures
            .as_ref()
            .filter(|signatures| !join(signatures, ',').is_empty())
            .cloned();

        let namespace_path = edge
            .namespace
            .as_ref()
            .filter(|segments| !join(segments, NESTED_SEPARATOR).is_empty())
            .map(|segments| NamespacePath::Segments(segments.clone()));

        TypeHierarchyFact {
            super_simple_name,
            super_qualification,
            simple_name,
            enclosing_type_name,
            type_parameter_signatures,
            namespace_path,
            super_kind: edge.super_kind,
            kind: edge.kind,
            modifiers: edge.modifiers,
        }
    }

    /// Whether the declaring type is anonymous.
    pub fn is_anonymous(&self) -> bool {
        matches!(self.enclosing_type_name, Some(EnclosingType::Anonymous))
    }

    /// Namespace segments with any back-reference expanded.
    pub fn resolved_namespace_path(&self) -> Option<Vec<String>> {
        match &self.namespace_path {
            None => None,
            Some(NamespacePath::Segments(segments)) => Some(segments.clone()),
            Some(NamespacePath::SameAsSuperQualification) => self
                .super_qualification
                .as_ref()
                .map(|q| q.split(NESTED_SEPARATOR).map(str::to_string).collect()),
        }
    }

    /// A copy of this fact with the namespace back-reference expanded.
    pub fn resolved(&self) -> TypeHierarchyFact {
        TypeHierarchyFact {
            namespace_path: self.resolved_namespace_path().map(NamespacePath::Segments),
            ..self.clone()
        }
    }

    /// The supertype name as it appeared in source (`p.Outer$Inner`).
    pub fn qualified_super_type_name(&self) -> String {
        match self.super_qualification.as_deref() {
            None => self.super_simple_name.clone(),
            Some(q) if q.ends_with(NESTED_SEPARATOR) => format!("{q}{}", self.super_simple_name),
            Some(q) => format!("{q}{NAMESPACE_SEPARATOR}{}", self.super_simple_name),
        }
    }
}

/// Split a supertype name into `(qualification, simple name)`.
///
/// A nested simple name (`Outer$Inner`) keeps only its innermost segment; the
/// `$`-terminated prefix is folded into the qualification.
fn split_super_type_name(name: &str) -> (Option<String>, String) {
    let (mut qualification, mut simple) = match name.rfind(NAMESPACE_SEPARATOR) {
        Some(dot) => (Some(name[..dot].to_string()), name[dot + 1..].to_string()),
        None => (None, name.to_string()),
    };

    if let Some(dollar) = simple.rfind(NESTED_SEPARATOR) {
        let prefix = &simple[..=dollar];
        let mangled = match qualification {
            Some(q) => format!("{q}{NAMESPACE_SEPARATOR}{prefix}"),
            None => prefix.to_string(),
        };
        qualification = Some(mangled);
        simple = simple[dollar + 1..].to_string();
    }

    (qualification.filter(|q| !q.is_empty()), simple)
}

/// Reconstruct the enclosing type name from a mangled qualification.
///
/// `p.Outer$` becomes `p.Outer`; plain qualifications are returned unchanged.
pub fn enclosing_qualification(qualification: &str) -> &str {
    qualification
        .strip_suffix(NESTED_SEPARATOR)
        .unwrap_or(qualification)
}

pub(crate) fn join(parts: &[String], separator: char) -> String {
    let mut joined = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            joined.push(separator);
        }
        joined.push_str(part);
    }
    joined
}

// ============================================================================
// Tests
// ============================================================================
