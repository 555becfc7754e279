//! Configuration errors.

use super::error_code::{self, ParamSpecErrorCode};

/// Errors raised while resolving the layered paramspec config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A `paramspec.toml` or `~/.paramspec/config.toml` layer could not be read.
    #[error("cannot read paramspec config file {path}")]
    FileNotFound { path: String },

    #[error("invalid TOML in paramspec config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("cannot serialize paramspec config: {message}")]
    Serialize { message: String },

    /// A resolved `[validation]` or `[logging]` key failed its check.
    #[error("paramspec config `{field}` {message}")]
    ValidationFailed { field: String, message: String },

    /// A `PARAMSPEC_*` environment override did not parse.
    #[error("environment override {field} is invalid: {message}")]
    InvalidValue { field: String, message: String },
}

impl ParamSpecErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        error_code::CONFIG_ERROR
    }
}
