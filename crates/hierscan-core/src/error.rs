//! Error types and error code constants for supertype search.
//!
//! `SearchError` is the single error type returned by the codec, the pattern
//! matcher and the query planner. Index failures are carried through
//! unchanged as [`SearchError::IndexUnavailable`].
//!
//! ## Error Code Mapping
//!
//! Exit codes used by the `hscan` front door:
//! - `2`: Invalid arguments (bad pattern, unsupported match mode, bad config)
//! - `3`: Resolution errors (input file not found)
//! - `4`: Index unavailable (the index service failed)
//! - `5`: Corrupt index data
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::codec::IndexKey;
use crate::index::IndexError;
use crate::pattern::MatchMode;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes for JSON output and process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad pattern, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (input file not found).
    ResolutionError = 3,
    /// The index service could not answer the query.
    IndexUnavailable = 4,
    /// Index data could not be decoded.
    CorruptIndex = 5,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Search Error
// ============================================================================

/// Errors raised while encoding, decoding, planning or matching.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A stored key does not follow the supertype-reference layout.
    ///
    /// During a multi-entry scan this aborts only the offending entry.
    #[error("corrupt index key '{key}': {reason}")]
    CorruptIndexKey { key: String, reason: String },

    /// The match mode cannot be evaluated in the current configuration.
    #[error("unsupported match mode '{mode}': {reason}")]
    UnsupportedMatchMode { mode: MatchMode, reason: String },

    /// A glob or regular expression pattern failed to compile.
    #[error("invalid {mode} pattern '{pattern}': {message}")]
    InvalidPattern {
        pattern: String,
        mode: MatchMode,
        message: String,
    },

    /// The index service failed; the original error is kept as is.
    #[error(transparent)]
    IndexUnavailable(#[from] IndexError),
}

impl SearchError {
    /// Create a corrupt-key error for `key`.
    pub fn corrupt_key(key: &IndexKey, reason: impl Into<String>) -> Self {
        SearchError::CorruptIndexKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-mode error.
    pub fn unsupported_mode(mode: MatchMode, reason: impl Into<String>) -> Self {
        SearchError::UnsupportedMatchMode {
            mode,
            reason: reason.into(),
        }
    }
}

impl From<&SearchError> for OutputErrorCode {
    fn from(err: &SearchError) -> Self {
        match err {
            SearchError::CorruptIndexKey { .. } => OutputErrorCode::CorruptIndex,
            SearchError::UnsupportedMatchMode { .. } => OutputErrorCode::InvalidArguments,
            SearchError::InvalidPattern { .. } => OutputErrorCode::InvalidArguments,
            SearchError::IndexUnavailable(IndexError::InvalidQuery { .. }) => {
                OutputErrorCode::InvalidArguments
            }
            SearchError::IndexUnavailable(_) => OutputErrorCode::IndexUnavailable,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
