//! Error bridge implementations for subsystem errors.
//!
//! This module provides `impl From<X> for CliError` conversions from the
//! core crate's error types to the unified `CliError` type.

use std::io;

use hierscan_core::config::ConfigError;
use hierscan_core::error::SearchError;
use hierscan_core::index::IndexError;

use crate::error::CliError;

// ============================================================================
// Bridge: SearchError -> CliError
// ============================================================================

impl From<SearchError> for CliError {
    fn from(err: SearchError) -> Self {
        CliError::Search(err)
    }
}

impl From<IndexError> for CliError {
    fn from(err: IndexError) -> Self {
        CliError::Search(SearchError::from(err))
    }
}

// ============================================================================
// Bridge: ConfigError -> CliError
// ============================================================================

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err)
    }
}

// ============================================================================
// Bridge: io::Error -> CliError
// ============================================================================

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}
