//! hierscan: supertype-reference search over a source index
//!
//! Answers "which types extend or implement X?" against index keys that
//! encode one supertype edge each, and exposes the search as a JSON CLI.

// Core infrastructure - re-exported from hierscan-core
pub use hierscan_core::codec;
pub use hierscan_core::config;
pub use hierscan_core::facts;
pub use hierscan_core::index;
pub use hierscan_core::matcher;
pub use hierscan_core::pattern;
pub use hierscan_core::planner;

// Front door for agents
pub mod cli;
pub mod error;
pub mod output;

// Error bridges - converts core errors to CliError
mod error_bridges;
