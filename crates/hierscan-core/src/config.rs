//! Search configuration.
//!
//! Settings are layered with precedence tracking:
//!
//! 1. CLI flags
//! 2. Environment variables (`HIERSCAN_REGEX`, `HIERSCAN_CASE_SENSITIVE`,
//!    `HIERSCAN_CAMEL_CASE`)
//! 3. Project config (`.hierscan/config.toml`, `[search]` table)
//! 4. Defaults
//!
//! ```toml
//! [search]
//! regex_enabled = false
//! case_sensitive = true
//! camel_case = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pattern::{MatchMode, MatchRule};

/// Directory holding project-level configuration.
pub const CONFIG_DIR: &str = ".hierscan";

/// Project config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

pub const ENV_REGEX: &str = "HIERSCAN_REGEX";
pub const ENV_CASE_SENSITIVE: &str = "HIERSCAN_CASE_SENSITIVE";
pub const ENV_CAMEL_CASE: &str = "HIERSCAN_CAMEL_CASE";

// ============================================================================
// Errors
// ============================================================================

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for {name}: expected a boolean")]
    InvalidEnv { name: String, value: String },
}

// ============================================================================
// Search Config
// ============================================================================

/// Effective settings consulted by the planner and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Whether `Regexp` patterns may be evaluated.
    pub regex_enabled: bool,
    /// Default case sensitivity for new patterns.
    pub case_sensitive: bool,
    /// Default camel-case flag for new patterns.
    pub camel_case: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            regex_enabled: true,
            case_sensitive: true,
            camel_case: false,
        }
    }
}

impl SearchConfig {
    /// A rule for `mode` carrying this configuration's defaults.
    pub fn rule(&self, mode: MatchMode) -> MatchRule {
        MatchRule::new(mode)
            .with_case_sensitive(self.case_sensitive)
            .with_camel_case(self.camel_case)
    }
}

// ============================================================================
// Project Config
// ============================================================================

/// Contents of `.hierscan/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub search: SearchSection,
}

/// The `[search]` table. Unset keys fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub regex_enabled: Option<bool>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub camel_case: Option<bool>,
}

impl ProjectConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `.hierscan/config.toml` under `project_root`, if present.
    pub fn load_from_project(project_root: &Path) -> Result<Option<Self>, ConfigError> {
        let path = project_root.join(CONFIG_DIR).join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From `.hierscan/config.toml`.
    ProjectConfig = 1,
    /// From environment variable.
    EnvVar = 2,
    /// From CLI flag (highest precedence).
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    /// Merge with another value, preferring higher precedence.
    pub fn merge(self, other: Self) -> Self {
        if other.source >= self.source {
            other
        } else {
            self
        }
    }
}

/// CLI configuration overrides.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    /// `--no-regex` sets this to `false`.
    pub regex_enabled: Option<bool>,
    /// `--case-insensitive` sets this to `false`.
    pub case_sensitive: Option<bool>,
    /// `--camel-case` sets this to `true`.
    pub camel_case: Option<bool>,
}

// ============================================================================
// Configuration Resolution
// ============================================================================

/// Resolved configuration with precedence information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub regex_enabled: ConfigValue<bool>,
    pub case_sensitive: ConfigValue<bool>,
    pub camel_case: ConfigValue<bool>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let defaults = SearchConfig::default();
        ResolvedConfig {
            regex_enabled: ConfigValue::new(defaults.regex_enabled, ConfigSource::Default),
            case_sensitive: ConfigValue::new(defaults.case_sensitive, ConfigSource::Default),
            camel_case: ConfigValue::new(defaults.camel_case, ConfigSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Resolve configuration from all layers.
    ///
    /// `env` looks up an environment variable; pass `|name| std::env::var(name).ok()`
    /// outside of tests.
    pub fn resolve(
        project: Option<&ProjectConfig>,
        cli: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = ResolvedConfig::default();

        if let Some(project) = project {
            let search = &project.search;
            config.apply(
                search.regex_enabled,
                search.case_sensitive,
                search.camel_case,
                ConfigSource::ProjectConfig,
            );
        }

        config.apply(
            env_flag(&env, ENV_REGEX)?,
            env_flag(&env, ENV_CASE_SENSITIVE)?,
            env_flag(&env, ENV_CAMEL_CASE)?,
            ConfigSource::EnvVar,
        );

        config.apply(
            cli.regex_enabled,
            cli.case_sensitive,
            cli.camel_case,
            ConfigSource::CliFlag,
        );

        tracing::debug!(
            "Resolved search config: regex={:?} case_sensitive={:?} camel_case={:?}",
            config.regex_enabled,
            config.case_sensitive,
            config.camel_case
        );
        Ok(config)
    }

    /// Resolve against the process environment.
    ///
    /// `config_path` replaces the project lookup under `project_root`.
    pub fn from_environment(
        project_root: &Path,
        config_path: Option<&Path>,
        cli: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let project = match config_path {
            Some(path) => Some(ProjectConfig::load(path)?),
            None => ProjectConfig::load_from_project(project_root)?,
        };
        Self::resolve(project.as_ref(), cli, |name| std::env::var(name).ok())
    }

    /// The plain settings, without source information.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            regex_enabled: self.regex_enabled.value,
            case_sensitive: self.case_sensitive.value,
            camel_case: self.camel_case.value,
        }
    }

    fn apply(
        &mut self,
        regex_enabled: Option<bool>,
        case_sensitive: Option<bool>,
        camel_case: Option<bool>,
        source: ConfigSource,
    ) {
        merge_into(&mut self.regex_enabled, regex_enabled, source);
        merge_into(&mut self.case_sensitive, case_sensitive, source);
        merge_into(&mut self.camel_case, camel_case, source);
    }
}

fn merge_into(slot: &mut ConfigValue<bool>, value: Option<bool>, source: ConfigSource) {
    if let Some(value) = value {
        *slot = slot.merge(ConfigValue::new(value, source));
    }
}

fn env_flag(
    env: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = env(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
