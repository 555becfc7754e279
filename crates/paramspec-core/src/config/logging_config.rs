//! Logging configuration.

use serde::{Deserialize, Serialize};

use crate::tracing::setup::DEFAULT_FILTER;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `PARAMSPEC_LOG` is unset.
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn effective_filter(&self) -> &str {
        self.filter.as_deref().unwrap_or(DEFAULT_FILTER)
    }
}
