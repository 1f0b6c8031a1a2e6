//! CLI front door helpers.
//!
//! Provides the command implementations behind `hscan`:
//! - `keys` - Encode every edge of an edge file and list the index keys
//! - `search` - Index an edge file and run a supertype search against it
//!
//! ## Edge Files
//!
//! An edge file is a JSON array of records. Each record names the document it
//! came from plus the fields of one supertype edge:
//!
//! ```json
//! [
//!   { "document": "src/Impl.java", "type_name": "Impl",
//!     "super_type_name": "lib.Base", "namespace": ["app"] }
//! ]
//! ```
//!
//! ## Error Handling
//!
//! All functions return `Result<T, CliError>`; the binary turns errors into
//! JSON error responses with stable exit codes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hierscan_core::config::SearchConfig;
use hierscan_core::facts::SuperTypeEdge;
use hierscan_core::index::MemoryIndex;
use hierscan_core::pattern::{MatchMode, QueryPattern, SearchPattern, SuperRefKind};
use hierscan_core::{encode_edge, planner};

use crate::error::CliError;
use crate::output::{KeyInfo, KeysResponse, MatchInfo, SearchResponse};

// ============================================================================
// Edge Files
// ============================================================================

/// One record of an edge file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Document the edge was extracted from.
    pub document: String,
    #[serde(flatten)]
    pub edge: SuperTypeEdge,
}

/// Read an edge file, rejecting edges whose fields would not survive encoding.
pub fn load_edges(path: &Path) -> Result<Vec<EdgeRecord>, CliError> {
    if !path.exists() {
        return Err(CliError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path)?;
    let records: Vec<EdgeRecord> =
        serde_json::from_str(&content).map_err(|e| CliError::InvalidInput {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    for record in &records {
        record.edge.validate().map_err(|e| CliError::InvalidInput {
            path: path.display().to_string(),
            message: format!("edge from {}: {}", record.document, e),
        })?;
    }

    tracing::info!("Loaded {} edges from {}", records.len(), path.display());
    Ok(records)
}

/// Build an in-memory index holding one supertype reference per record.
pub fn build_index(records: &[EdgeRecord]) -> MemoryIndex {
    let mut index = MemoryIndex::new();
    for record in records {
        index.index_edge(record.document.clone(), &record.edge);
    }
    index
}

// ============================================================================
// Commands
// ============================================================================

/// Encode every edge in `edges_path`.
pub fn run_keys(edges_path: &Path) -> Result<KeysResponse, CliError> {
    let keys = load_edges(edges_path)?
        .into_iter()
        .map(|record| {
            let key = encode_edge(&record.edge);
            KeyInfo {
                document: record.document,
                key: key.to_string(),
                units: key.len(),
            }
        })
        .collect();
    Ok(KeysResponse::new(keys))
}

/// Parameters of the `search` command.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Supertype simple names; several names form a disjunction.
    pub super_names: Vec<String>,
    pub qualification: Option<String>,
    pub mode: MatchMode,
    pub ref_kind: SuperRefKind,
}

impl SearchRequest {
    /// Build the search pattern, taking case and camel-case defaults from `config`.
    pub fn to_pattern(&self, config: &SearchConfig) -> SearchPattern {
        let query = |name: Option<&str>| {
            let mut query = match name {
                Some(name) => QueryPattern::super_type(name),
                None => QueryPattern::any(),
            };
            if let Some(qualification) = &self.qualification {
                query = query.with_qualification(qualification.clone());
            }
            SearchPattern::from(
                query
                    .with_ref_kind(self.ref_kind)
                    .with_rule(config.rule(self.mode)),
            )
        };

        match self.super_names.as_slice() {
            [] => query(None),
            [name] => query(Some(name)),
            names => SearchPattern::Or(names.iter().map(|name| query(Some(name))).collect()),
        }
    }
}

/// Index `edges_path` and run `request` against it.
pub fn run_search(
    edges_path: &Path,
    request: &SearchRequest,
    config: &SearchConfig,
) -> Result<SearchResponse, CliError> {
    let records = load_edges(edges_path)?;
    let index = build_index(&records);
    let pattern = request.to_pattern(config);

    let mut results = planner::search(&index, &pattern, config)?;
    let matches: Vec<MatchInfo> = results.by_ref().map(|found| MatchInfo::from(&found)).collect();
    let skipped = results.skipped();
    if skipped > 0 {
        tracing::warn!("{} index entries could not be decoded", skipped);
    }

    let query = pattern.queries().iter().map(ToString::to_string).collect();
    Ok(SearchResponse::new(query, *config, matches, skipped))
}
