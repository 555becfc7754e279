//! Dimension definition errors.

use super::error_code::{self, ParamSpecErrorCode};

/// Errors raised while building the dimension validator registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DimensionDefinitionError {
    #[error("dimension `{dimension}`: unknown validator kind `{kind}`")]
    UnknownValidatorKind { dimension: String, kind: String },

    #[error("dimension `{dimension}`: unknown type `{type_name}`")]
    UnknownType { dimension: String, type_name: String },

    #[error("dimension `{dimension}`: min {min} is greater than max {max}")]
    InvalidBounds {
        dimension: String,
        min: String,
        max: String,
    },

    #[error("dimension `{dimension}`: {message}")]
    InvalidParameters { dimension: String, message: String },

    #[error("dimension `{dimension}`: bound references unknown parameter `{param}`")]
    UnknownReference { dimension: String, param: String },
}

impl DimensionDefinitionError {
    /// Name of the dimension the error concerns.
    pub fn dimension(&self) -> &str {
        match self {
            Self::UnknownValidatorKind { dimension, .. }
            | Self::UnknownType { dimension, .. }
            | Self::InvalidBounds { dimension, .. }
            | Self::InvalidParameters { dimension, .. }
            | Self::UnknownReference { dimension, .. } => dimension,
        }
    }
}

impl ParamSpecErrorCode for DimensionDefinitionError {
    fn error_code(&self) -> &'static str {
        error_code::DIMENSION_DEFINITION_ERROR
    }
}
