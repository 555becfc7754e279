//! Compilation errors. Fatal to the compile step: no partial schema is published.

use super::error_code::{self, ParamSpecErrorCode};
use super::{DimensionDefinitionError, TypeResolutionError};

/// Underlying reason a single parameter failed to compile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompilationCause {
    #[error(transparent)]
    TypeResolution(#[from] TypeResolutionError),

    #[error("invalid validator: {0}")]
    InvalidValidator(String),

    #[error("validator references unknown parameter `{0}`")]
    UnknownReference(String),

    #[error("reference `{reference}` has type {reference_type}, not comparable with {value_type}")]
    IncomparableReference {
        reference: String,
        reference_type: String,
        value_type: String,
    },
}

/// A parameter could not be compiled into a schema fragment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parameter `{param}`: {cause}")]
pub struct ParameterCompilationError {
    pub param: String,
    #[source]
    pub cause: CompilationCause,
}

impl ParameterCompilationError {
    pub fn new(param: impl Into<String>, cause: impl Into<CompilationCause>) -> Self {
        Self {
            param: param.into(),
            cause: cause.into(),
        }
    }
}

impl ParamSpecErrorCode for ParameterCompilationError {
    fn error_code(&self) -> &'static str {
        match self.cause {
            CompilationCause::TypeResolution(ref e) => e.error_code(),
            _ => error_code::PARAMETER_COMPILATION_ERROR,
        }
    }
}

/// Errors from `compile(schema_definition, baseline_spec)`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),

    #[error("invalid baseline spec: {0}")]
    InvalidBaseline(String),

    #[error("dimension definition error: {0}")]
    Dimension(#[from] DimensionDefinitionError),

    #[error("parameter compilation error: {0}")]
    Parameter(#[from] ParameterCompilationError),
}

impl ParamSpecErrorCode for CompileError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDefinition(_) | Self::InvalidBaseline(_) => error_code::INVALID_DEFINITION,
            Self::Dimension(e) => e.error_code(),
            Self::Parameter(e) => e.error_code(),
        }
    }
}
