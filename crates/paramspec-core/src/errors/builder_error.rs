//! Top-level error for the `SchemaBuilder` facade.
//! Aggregates subsystem errors via `From` conversions.

use super::error_code::{self, ParamSpecErrorCode};
use super::{CompileError, ConfigError, LoadError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("schemas have not been built; call build_schemas first")]
    NotBuilt,
}

impl BuilderError {
    /// The aggregate validation failure, if that is what this is.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl ParamSpecErrorCode for BuilderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Load(e) => e.error_code(),
            Self::Compile(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::NotBuilt => error_code::NOT_BUILT,
        }
    }
}
