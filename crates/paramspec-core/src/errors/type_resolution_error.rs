//! Type resolution errors.

use super::error_code::{self, ParamSpecErrorCode};

/// Errors raised while inferring the field type of a raw baseline value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeResolutionError {
    #[error("cannot infer a type from an empty value")]
    EmptyValue,

    #[error("metadata object has no `value` field")]
    MissingValue,

    #[error("ambiguous value type: found both {first} and {second}")]
    AmbiguousType { first: String, second: String },

    #[error("unsupported value shape: {detail}")]
    UnsupportedValue { detail: String },

    #[error("unknown type name `{name}`")]
    UnknownTypeName { name: String },

    #[error("inconsistent array nesting: expected {expected} dimension(s), found {found}")]
    InconsistentDims { expected: usize, found: usize },
}

impl ParamSpecErrorCode for TypeResolutionError {
    fn error_code(&self) -> &'static str {
        error_code::TYPE_RESOLUTION_ERROR
    }
}
