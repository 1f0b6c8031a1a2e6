//! Binary entry point for the hscan CLI.
//!
//! All output is JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Show the index keys an edge file produces
//! hscan keys edges.json
//!
//! # Find every type whose supertype is named Base
//! hscan search edges.json --super Base
//!
//! # Camel-case prefix search, classes only
//! hscan search edges.json --super NPE --mode prefix --camel-case --kind classes
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use hierscan::cli::{run_keys, run_search, SearchRequest};
use hierscan::config::{CliOverrides, ResolvedConfig};
use hierscan::error::{CliError, OutputErrorCode};
use hierscan::output::{emit_response, ErrorResponse};
use hierscan::pattern::{MatchMode, SuperRefKind};

// ============================================================================
// CLI Structure
// ============================================================================

/// Supertype search over a type-hierarchy index.
///
/// Reads supertype edges from a JSON file, indexes them, and answers
/// "which types extend or implement X?" as JSON.
#[derive(Parser, Debug)]
#[command(name = "hscan", version, about = "Supertype search over a type-hierarchy index")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Project root holding `.hierscan/config.toml` (default: current directory).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Explicit configuration file (overrides the project config).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// How supertype names are compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Exact,
    Prefix,
    Glob,
    Regexp,
}

impl From<ModeArg> for MatchMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Exact => MatchMode::Exact,
            ModeArg::Prefix => MatchMode::Prefix,
            ModeArg::Glob => MatchMode::Glob,
            ModeArg::Regexp => MatchMode::Regexp,
        }
    }
}

/// Which supertype references to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    All,
    Interfaces,
    Classes,
}

impl From<KindArg> for SuperRefKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::All => SuperRefKind::AllSuperTypes,
            KindArg::Interfaces => SuperRefKind::OnlySuperInterfaces,
            KindArg::Classes => SuperRefKind::OnlySuperClasses,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the index key of every edge in an edge file.
    Keys {
        /// JSON edge file.
        edges: PathBuf,
    },
    /// Search an edge file for supertype references.
    Search {
        /// JSON edge file.
        edges: PathBuf,
        /// Supertype simple name; repeat to search for any of several names.
        #[arg(long = "super", value_name = "NAME")]
        supers: Vec<String>,
        /// Supertype qualification (package, plus enclosing types for nested types).
        #[arg(long)]
        qualification: Option<String>,
        /// Match mode for the supertype name.
        #[arg(long, value_enum, default_value = "exact")]
        mode: ModeArg,
        /// Which supertype references to report.
        #[arg(long, value_enum, default_value = "all")]
        kind: KindArg,
        /// Ignore case when comparing names.
        #[arg(long)]
        case_insensitive: bool,
        /// Treat the name as camel-case humps.
        #[arg(long)]
        camel_case: bool,
        /// Reject regular-expression searches.
        #[arg(long)]
        no_regex: bool,
    },
}

impl Command {
    /// Settings given on the command line; unset flags defer to lower layers.
    fn overrides(&self) -> CliOverrides {
        match self {
            Command::Keys { .. } => CliOverrides::default(),
            Command::Search {
                case_insensitive,
                camel_case,
                no_regex,
                ..
            } => CliOverrides {
                regex_enabled: no_regex.then_some(false),
                case_sensitive: case_insensitive.then_some(false),
                camel_case: camel_case.then_some(true),
            },
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, same as results
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    match cli.command {
        Command::Keys { ref edges } => {
            let response = run_keys(edges)?;
            emit_response(&response, &mut stdout)?;
        }
        Command::Search {
            ref edges,
            ref supers,
            ref qualification,
            mode,
            kind,
            ..
        } => {
            let config = resolve_config(&cli.global, &cli.command)?;
            tracing::debug!(?config, "resolved search configuration");

            let request = SearchRequest {
                super_names: supers.clone(),
                qualification: qualification.clone(),
                mode: mode.into(),
                ref_kind: kind.into(),
            };
            let response = run_search(edges, &request, &config.search_config())?;
            emit_response(&response, &mut stdout)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

/// Layer defaults, project config, environment, and command-line flags.
fn resolve_config(global: &GlobalArgs, command: &Command) -> Result<ResolvedConfig, CliError> {
    let root = match &global.workspace {
        Some(path) => path.clone(),
        None => std::env::current_dir()?,
    };
    let config =
        ResolvedConfig::from_environment(&root, global.config.as_deref(), &command.overrides())?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_parsing {
        use super::*;

        #[test]
        fn parse_keys() {
            let cli = Cli::try_parse_from(["hscan", "keys", "edges.json"]).unwrap();
            match cli.command {
                Command::Keys { edges } => assert_eq!(edges, PathBuf::from("edges.json")),
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn parse_search_defaults() {
            let cli =
                Cli::try_parse_from(["hscan", "search", "edges.json", "--super", "Base"]).unwrap();
            match cli.command {
                Command::Search {
                    supers, mode, kind, ..
                } => {
                    assert_eq!(supers, ["Base"]);
                    assert_eq!(mode, ModeArg::Exact);
                    assert_eq!(kind, KindArg::All);
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn parse_repeated_super() {
            let args = [
                "hscan", "search", "edges.json", "--super", "A", "--super", "B",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::Search { supers, .. } => assert_eq!(supers, ["A", "B"]),
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn parse_mode_and_kind() {
            let args = [
                "hscan", "search", "edges.json", "--mode", "regexp", "--kind", "classes",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            match cli.command {
                Command::Search { mode, kind, .. } => {
                    assert_eq!(MatchMode::from(mode), MatchMode::Regexp);
                    assert_eq!(SuperRefKind::from(kind), SuperRefKind::OnlySuperClasses);
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn parse_invalid_mode() {
            let args = ["hscan", "search", "edges.json", "--mode", "fuzzy"];
            assert!(Cli::try_parse_from(args).is_err());
        }

        #[test]
        fn parse_global_flags_after_subcommand() {
            let args = [
                "hscan",
                "keys",
                "edges.json",
                "--log-level",
                "debug",
                "--config",
                "/tmp/hierscan.toml",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(matches!(cli.global.log_level, LogLevel::Debug));
            assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/hierscan.toml")));
        }

        #[test]
        fn default_log_level_is_warn() {
            let cli = Cli::try_parse_from(["hscan", "keys", "edges.json"]).unwrap();
            assert!(matches!(cli.global.log_level, LogLevel::Warn));
        }
    }

    mod overrides {
        use super::*;

        #[test]
        fn unset_flags_defer_to_lower_layers() {
            let cli = Cli::try_parse_from(["hscan", "search", "edges.json"]).unwrap();
            let overrides = cli.command.overrides();
            assert_eq!(overrides.regex_enabled, None);
            assert_eq!(overrides.case_sensitive, None);
            assert_eq!(overrides.camel_case, None);
        }

        #[test]
        fn set_flags_override() {
            let args = [
                "hscan",
                "search",
                "edges.json",
                "--case-insensitive",
                "--camel-case",
                "--no-regex",
            ];
            let cli = Cli::try_parse_from(args).unwrap();
            let overrides = cli.command.overrides();
            assert_eq!(overrides.regex_enabled, Some(false));
            assert_eq!(overrides.case_sensitive, Some(false));
            assert_eq!(overrides.camel_case, Some(true));
        }
    }

    #[test]
    fn trace_converts_to_tracing_level() {
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
    }
}
