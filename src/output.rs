//! JSON output types and serialization for CLI responses.
//!
//! These types form the agent contract of `hscan`:
//!
//! 1. **Always JSON:** All CLI output is valid JSON (no mixed text/JSON)
//! 2. **Status first:** Every response has `status` as first field
//! 3. **Deterministic:** Same input -> same output (field order, array ordering)
//! 4. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use hierscan_core::config::SearchConfig;
use hierscan_core::facts::{EnclosingType, TypeKind};
use hierscan_core::planner::SuperTypeMatch;

use crate::error::{CliError, OutputErrorCode};

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Keys
// ============================================================================

/// One encoded edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Document the edge was read from.
    pub document: String,
    /// Escaped printable form of the index key.
    pub key: String,
    /// Key length in UTF-16 units.
    pub units: usize,
}

/// Response for the `keys` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    pub keys: Vec<KeyInfo>,
}

impl KeysResponse {
    pub fn new(keys: Vec<KeyInfo>) -> Self {
        KeysResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            keys,
        }
    }
}

// ============================================================================
// Search
// ============================================================================

/// One search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchInfo {
    pub document: String,
    /// Simple name of the declaring type (empty for anonymous types).
    pub type_name: String,
    /// Supertype name as written in source (`p.Outer$Inner`).
    pub super_type: String,
    pub kind: TypeKind,
    pub super_kind: TypeKind,
    pub modifiers: u16,
    /// `$`-joined enclosing type names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
    pub anonymous: bool,
    /// Namespace of the declaring type, back-reference expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_parameters: Option<Vec<String>>,
}

impl From<&SuperTypeMatch> for MatchInfo {
    fn from(found: &SuperTypeMatch) -> Self {
        let fact = &found.fact;
        let enclosing = match &fact.enclosing_type_name {
            Some(EnclosingType::Named(names)) => Some(names.clone()),
            _ => None,
        };
        MatchInfo {
            document: found.document.clone(),
            type_name: fact.simple_name.clone(),
            super_type: fact.qualified_super_type_name(),
            kind: fact.kind,
            super_kind: fact.super_kind,
            modifiers: fact.modifiers,
            enclosing,
            anonymous: fact.is_anonymous(),
            namespace: fact.resolved_namespace_path(),
            type_parameters: fact.type_parameter_signatures.clone(),
        }
    }
}

/// Response for the `search` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Status: "ok".
    pub status: String,
    pub schema_version: String,
    /// Human-readable form of the query.
    pub query: Vec<String>,
    /// Effective configuration after layering.
    pub config: SearchConfig,
    pub matches: Vec<MatchInfo>,
    /// Entries skipped because their keys could not be decoded.
    pub skipped: usize,
}

impl SearchResponse {
    pub fn new(
        query: Vec<String>,
        config: SearchConfig,
        matches: Vec<MatchInfo>,
        skipped: usize,
    ) -> Self {
        SearchResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            query,
            config,
            matches,
            skipped,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error information for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code (also the process exit code).
    pub code: u8,
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a CliError.
    pub fn from_error(err: &CliError) -> Self {
        let details = match err {
            CliError::InvalidArguments { details, .. } => details.clone(),
            CliError::FileNotFound { path } | CliError::InvalidInput { path, .. } => {
                Some(serde_json::json!({ "path": path }))
            }
            _ => None,
        };
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
            details,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Create an error response from a CliError.
    pub fn from_error(err: &CliError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emission
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// The output is deterministic: same input produces identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}
