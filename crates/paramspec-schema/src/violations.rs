//! Violation collection for one validation run.

use paramspec_core::errors::{ValidationError, ValidationStage, Violation, ViolationKind};

use crate::rules::RuleFailure;

/// Collects violations during a run; nothing is reported until [`finish`].
///
/// [`finish`]: ViolationSink::finish
#[derive(Debug, Default)]
pub(crate) struct ViolationSink {
    violations: Vec<Violation>,
}

impl ViolationSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(
        &mut self,
        param: &str,
        entry_index: Option<usize>,
        field: &str,
        kind: ViolationKind,
        message: impl Into<String>,
    ) {
        self.violations
            .push(Violation::new(param, entry_index, field, kind, message));
    }

    /// Record a failed rule. Label checks report `InvalidLabel` unless the
    /// bound itself could not be resolved.
    pub(crate) fn push_failure(
        &mut self,
        param: &str,
        entry_index: Option<usize>,
        field: &str,
        failure: RuleFailure,
        is_label: bool,
    ) {
        let kind = match failure.kind {
            ViolationKind::ContextResolution => ViolationKind::ContextResolution,
            _ if is_label => ViolationKind::InvalidLabel,
            other => other,
        };
        self.push(param, entry_index, field, kind, failure.message);
    }

    pub(crate) fn len(&self) -> usize {
        self.violations.len()
    }

    /// Order by parameter then entry (parameter-level problems first) and
    /// apply the violation cap.
    pub(crate) fn finish(
        mut self,
        stage: ValidationStage,
        max_violations: Option<usize>,
    ) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            return Ok(());
        }
        self.violations
            .sort_by(|a, b| (&a.param, a.entry_index).cmp(&(&b.param, b.entry_index)));

        let mut error = ValidationError::new(stage, self.violations);
        if let Some(max) = max_violations {
            if error.violations.len() > max {
                error.violations.truncate(max);
                error.truncated = true;
            }
        }
        Err(error)
    }
}
