//! Unified error type for the `hscan` front door.
//!
//! Subsystem errors (`SearchError`, `ConfigError`) are bridged into
//! [`CliError`] before they are rendered as JSON. Exit codes come from
//! [`OutputErrorCode`]:
//!
//! - `2`: Invalid arguments (bad pattern, unsupported mode, bad config, bad input file)
//! - `3`: Resolution errors (input file not found)
//! - `4`: Index unavailable
//! - `5`: Corrupt index data
//! - `10`: Internal errors

use thiserror::Error;

use hierscan_core::config::ConfigError;
pub use hierscan_core::error::OutputErrorCode;
use hierscan_core::error::SearchError;

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Input file exists but is not a valid edge list.
    #[error("invalid input file {path}: {message}")]
    InvalidInput { path: String, message: String },

    /// Search failed.
    #[error(transparent)]
    Search(SearchError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(ConfigError),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl CliError {
    /// Create an invalid-arguments error without details.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CliError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::InternalError {
            message: message.into(),
        }
    }
}

impl From<&CliError> for OutputErrorCode {
    fn from(err: &CliError) -> Self {
        match err {
            CliError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CliError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            CliError::InvalidInput { .. } => OutputErrorCode::InvalidArguments,
            CliError::Search(search) => OutputErrorCode::from(search),
            CliError::Config(_) => OutputErrorCode::InvalidArguments,
            CliError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierscan_core::{IndexError, MatchMode};

    #[test]
    fn codes_follow_error_kind() {
        let cases = [
            (CliError::invalid_args("bad"), 2),
            (
                CliError::FileNotFound {
                    path: "edges.json".to_string(),
                },
                3,
            ),
            (
                CliError::from(SearchError::unsupported_mode(MatchMode::Regexp, "disabled")),
                2,
            ),
            (
                CliError::from(SearchError::from(IndexError::Unavailable {
                    message: "down".to_string(),
                })),
                4,
            ),
            (CliError::internal("oops"), 10),
        ];
        for (err, code) in cases {
            assert_eq!(OutputErrorCode::from(&err).code(), code, "{err}");
        }
    }

    #[test]
    fn search_errors_render_unchanged() {
        let err = CliError::from(SearchError::unsupported_mode(MatchMode::Regexp, "disabled"));
        assert_eq!(err.to_string(), "unsupported match mode 'regexp': disabled");
    }
}
