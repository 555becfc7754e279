//! Top-level paramspec configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{LoggingConfig, ValidationConfig};
use crate::errors::ConfigError;

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "paramspec.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Explicit overrides (applied via `apply_overrides`)
/// 2. Environment variables (`PARAMSPEC_*`)
/// 3. Project config (`paramspec.toml` in project root)
/// 4. User config (`~/.paramspec/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParamSpecConfig {
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

/// Override arguments that can be applied on top of every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub infer_date_strings: Option<bool>,
    pub strict_metadata: Option<bool>,
    pub max_violations: Option<usize>,
    pub log_filter: Option<String>,
}

impl ParamSpecConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Lowest priority: user config. Unreadable user files are ignored,
        // malformed ones are not.
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config)?;

        if let Some(overrides) = overrides {
            Self::apply_overrides(&mut config, overrides);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &ParamSpecConfig) -> Result<(), ConfigError> {
        if config.validation.max_violations == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "validation.max_violations".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(filter) = &config.logging.filter {
            if filter.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "logging.filter".to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })
    }

    /// Returns the user config path: `~/.paramspec/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".paramspec").join("config.toml"))
    }

    fn merge_toml_file(config: &mut ParamSpecConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ParamSpecConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it has a value.
    fn merge(base: &mut ParamSpecConfig, other: &ParamSpecConfig) {
        if other.validation.infer_date_strings.is_some() {
            base.validation.infer_date_strings = other.validation.infer_date_strings;
        }
        if other.validation.strict_metadata.is_some() {
            base.validation.strict_metadata = other.validation.strict_metadata;
        }
        if other.validation.max_violations.is_some() {
            base.validation.max_violations = other.validation.max_violations;
        }
        if other.logging.filter.is_some() {
            base.logging.filter = other.logging.filter.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `PARAMSPEC_STRICT_METADATA`, `PARAMSPEC_MAX_VIOLATIONS`, etc.
    fn apply_env_overrides(config: &mut ParamSpecConfig) -> Result<(), ConfigError> {
        if let Some(v) = env_parse::<bool>("PARAMSPEC_INFER_DATE_STRINGS")? {
            config.validation.infer_date_strings = Some(v);
        }
        if let Some(v) = env_parse::<bool>("PARAMSPEC_STRICT_METADATA")? {
            config.validation.strict_metadata = Some(v);
        }
        if let Some(v) = env_parse::<usize>("PARAMSPEC_MAX_VIOLATIONS")? {
            config.validation.max_violations = Some(v);
        }
        if let Ok(val) = std::env::var("PARAMSPEC_LOG_FILTER") {
            config.logging.filter = Some(val);
        }
        Ok(())
    }

    fn apply_overrides(config: &mut ParamSpecConfig, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.infer_date_strings {
            config.validation.infer_date_strings = Some(v);
        }
        if let Some(v) = overrides.strict_metadata {
            config.validation.strict_metadata = Some(v);
        }
        if let Some(v) = overrides.max_violations {
            config.validation.max_violations = Some(v);
        }
        if let Some(ref v) = overrides.log_filter {
            config.logging.filter = Some(v.clone());
        }
    }
}

/// Parse an env var if set. A set-but-unparseable value is an error.
fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
