//! Core infrastructure for hierscan.
//!
//! This crate provides the type-hierarchy search subsystem of a source index:
//! - Supertype edges and their normalized index records
//! - Index key encoding and decoding
//! - Query patterns and the pattern matcher
//! - Query planning against a pluggable index service
//! - Layered search configuration
//! - Error types and error codes
//!
//! ```
//! use hierscan_core::{search, MemoryIndex, QueryPattern, SearchConfig, SuperTypeEdge};
//!
//! let mut index = MemoryIndex::new();
//! index.index_edge("src/Impl.java", &SuperTypeEdge::new("Impl", Some("lib.Base")));
//!
//! let pattern = QueryPattern::super_type("Base").into();
//! let found: Vec<_> = search(&index, &pattern, &SearchConfig::default())
//!     .unwrap()
//!     .collect();
//! assert_eq!(found[0].fact.simple_name, "Impl");
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod facts;
pub mod index;
pub mod matcher;
pub mod pattern;
pub mod planner;

pub use codec::{decode, encode, encode_edge, IndexKey};
pub use config::{CliOverrides, ConfigError, ResolvedConfig, SearchConfig};
pub use error::{OutputErrorCode, SearchError};
pub use facts::{
    EnclosingType, NamespacePath, ReservedValue, SuperTypeEdge, TypeHierarchyFact, TypeKind,
};
pub use index::{Category, EntryIter, Index, IndexError, MemoryIndex, RawEntry, SUPER_REF};
pub use matcher::{camel_case_match, matches, PatternMatcher};
pub use pattern::{MatchMode, MatchRule, QueryPattern, SearchPattern, SuperRefKind};
pub use planner::{
    execute, filter, plan, search, LookupPlan, Matches, SearchResults, SuperTypeMatch,
};
