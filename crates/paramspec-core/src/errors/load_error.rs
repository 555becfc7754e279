//! Errors from reading JSON documents off disk or out of strings.

use super::error_code::{self, ParamSpecErrorCode};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid JSON in {origin}: {message}")]
    Json { origin: String, message: String },
}

impl ParamSpecErrorCode for LoadError {
    fn error_code(&self) -> &'static str {
        error_code::LOAD_ERROR
    }
}
