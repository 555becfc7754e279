//! Data-time validation errors.
//!
//! Validation never fails on the first problem. Every violation found in a
//! document is collected and returned as one [`ValidationError`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error_code::{self, ParamSpecErrorCode};

/// Which entry point produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStage {
    Baseline,
    Revision,
}

impl ValidationStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Revision => "revision",
        }
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of a single violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Parameter name is not part of the compiled schema.
    UnknownParameter,
    /// Document, parameter, or entry has the wrong JSON shape.
    InvalidStructure,
    /// A required field (usually `value`) is absent.
    MissingField,
    /// A metadata key that the schema does not declare.
    UnknownField,
    /// A value failed type coercion.
    InvalidType,
    /// A label failed its dimension's type or validators.
    InvalidLabel,
    /// An entry key that is neither `value` nor a declared dimension.
    UnknownDimension,
    /// Two entries of one parameter share a label assignment.
    DuplicateLabels,
    /// A value is outside a range bound.
    OutOfRange,
    /// A value is not one of the allowed choices.
    InvalidChoice,
    /// A bound references a parameter value that could not be found for
    /// the entry's label assignment.
    ContextResolution,
}

impl ViolationKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnknownParameter => "unknown_parameter",
            Self::InvalidStructure => "invalid_structure",
            Self::MissingField => "missing_field",
            Self::UnknownField => "unknown_field",
            Self::InvalidType => "invalid_type",
            Self::InvalidLabel => "invalid_label",
            Self::UnknownDimension => "unknown_dimension",
            Self::DuplicateLabels => "duplicate_labels",
            Self::OutOfRange => "out_of_range",
            Self::InvalidChoice => "invalid_choice",
            Self::ContextResolution => "context_resolution",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One problem found in one parameter (and, usually, one entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub param: String,
    /// Index of the offending entry; `None` for parameter-level problems.
    pub entry_index: Option<usize>,
    /// `value`, a dimension name, a metadata key, or `<param>` / `<document>`.
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(
        param: impl Into<String>,
        entry_index: Option<usize>,
        field: impl Into<String>,
        kind: ViolationKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            param: param.into(),
            entry_index,
            field: field.into(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry_index {
            Some(i) => write!(
                f,
                "{}[{}].{} ({}): {}",
                self.param, i, self.field, self.kind, self.message
            ),
            None => write!(f, "{}.{} ({}): {}", self.param, self.field, self.kind, self.message),
        }
    }
}

/// Aggregate failure from `validate_baseline` / `validate_revision`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub struct ValidationError {
    pub stage: ValidationStage,
    pub violations: Vec<Violation>,
    /// Set when `max_violations` cut the list short.
    pub truncated: bool,
}

impl ValidationError {
    pub fn new(stage: ValidationStage, violations: Vec<Violation>) -> Self {
        Self {
            stage,
            violations,
            truncated: false,
        }
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether any violation has the given kind.
    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    /// Violations that concern `param`.
    pub fn for_param<'a>(&'a self, param: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.param == param)
    }

    /// Distinct parameter names with at least one violation, in report order.
    pub fn params(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for v in &self.violations {
            if !out.contains(&v.param.as_str()) {
                out.push(&v.param);
            }
        }
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation failed with {} violation(s){}",
            self.stage,
            self.violations.len(),
            if self.truncated { " (truncated)" } else { "" }
        )?;
        for v in &self.violations {
            write!(f, "\n  - {v}")?;
        }
        Ok(())
    }
}

impl ParamSpecErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        let only = |kind: ViolationKind| {
            !self.violations.is_empty() && self.violations.iter().all(|v| v.kind == kind)
        };
        if only(ViolationKind::UnknownParameter) {
            error_code::UNKNOWN_PARAMETER
        } else if only(ViolationKind::ContextResolution) {
            error_code::CONTEXT_RESOLUTION_ERROR
        } else {
            error_code::VALIDATION_ERROR
        }
    }
}
