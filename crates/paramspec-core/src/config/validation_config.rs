//! Validation configuration.

use serde::{Deserialize, Serialize};

/// Knobs for type resolution and validation reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Resolve undeclared `YYYY-MM-DD` strings as dates. Default: true.
    pub infer_date_strings: Option<bool>,
    /// Reject undeclared keys on parameter metadata objects. Default: true.
    pub strict_metadata: Option<bool>,
    /// Cap on violations per aggregate failure. Default: unlimited.
    pub max_violations: Option<usize>,
}

impl ValidationConfig {
    pub fn effective_infer_date_strings(&self) -> bool {
        self.infer_date_strings.unwrap_or(true)
    }

    pub fn effective_strict_metadata(&self) -> bool {
        self.strict_metadata.unwrap_or(true)
    }

    pub fn effective_max_violations(&self) -> Option<usize> {
        self.max_violations
    }
}
