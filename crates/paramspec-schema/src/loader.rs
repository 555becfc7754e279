//! JSON document loading.

use std::path::{Path, PathBuf};

use paramspec_core::errors::LoadError;
use serde_json::Value;

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            LoadError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }
        }
    })?;
    parse_json(&content, &path.display().to_string())
}

fn parse_json(text: &str, origin: &str) -> Result<Value, LoadError> {
    serde_json::from_str(text).map_err(|e| LoadError::Json {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}

/// Where a parameter document comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsInput {
    /// A JSON file on disk.
    Path(PathBuf),
    /// JSON text.
    Json(String),
    /// An already-decoded document.
    Value(Value),
}

impl ParamsInput {
    pub fn into_value(self) -> Result<Value, LoadError> {
        match self {
            Self::Path(path) => read_json(&path),
            Self::Json(text) => parse_json(&text, "<string>"),
            Self::Value(value) => Ok(value),
        }
    }
}

impl From<Value> for ParamsInput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<PathBuf> for ParamsInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ParamsInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// A string naming an existing file is a path; anything else is JSON text.
impl From<&str> for ParamsInput {
    fn from(text: &str) -> Self {
        if Path::new(text).is_file() {
            Self::Path(PathBuf::from(text))
        } else {
            Self::Json(text.to_string())
        }
    }
}
