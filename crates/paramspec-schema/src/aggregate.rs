//! Schema aggregation: the baseline and revision schemas that dispatch each
//! top-level parameter of a document to its compiled fragment.

use std::collections::BTreeMap;
use std::sync::Arc;

use paramspec_core::errors::{ValidationError, ValidationStage, Violation, ViolationKind};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cleaned::{CleanedBaseline, CleanedRevision};
use crate::compiler::{CompileOptions, FragmentRegistry};
use crate::context::ValidationContext;
use crate::dimensions::DimensionRegistry;
use crate::rules::BoundMode;
use crate::types::{describe_json, Entry};
use crate::violations::ViolationSink;

/// Immutable compiled state shared by both schemas.
#[derive(Debug)]
struct SchemaParts {
    fragments: FragmentRegistry,
    dimensions: Arc<DimensionRegistry>,
    options: CompileOptions,
}

/// Validates a whole baseline document.
#[derive(Debug, Clone)]
pub struct BaselineSchema {
    parts: Arc<SchemaParts>,
}

/// Validates a whole revision document against a cleaned baseline.
#[derive(Debug, Clone)]
pub struct RevisionSchema {
    parts: Arc<SchemaParts>,
}

/// Combine compiled fragments into the two top-level schemas.
pub fn aggregate(
    fragments: FragmentRegistry,
    dimensions: Arc<DimensionRegistry>,
    options: CompileOptions,
) -> (BaselineSchema, RevisionSchema) {
    let parts = Arc::new(SchemaParts {
        fragments,
        dimensions,
        options,
    });
    (
        BaselineSchema {
            parts: Arc::clone(&parts),
        },
        RevisionSchema { parts },
    )
}

fn document_error(stage: ValidationStage, raw: &Value) -> ValidationError {
    ValidationError::new(
        stage,
        vec![Violation::new(
            "<document>",
            None,
            "<document>",
            ViolationKind::InvalidStructure,
            format!("expected an object of parameters, got {}", describe_json(raw)),
        )],
    )
}

impl BaselineSchema {
    pub fn fragments(&self) -> &FragmentRegistry {
        &self.parts.fragments
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        &self.parts.dimensions
    }

    pub fn options(&self) -> &CompileOptions {
        &self.parts.options
    }

    /// Validate a baseline document. Self-contained: reference bounds are
    /// not evaluated and value rules are not applied to baseline values.
    pub fn load(&self, raw: &Value) -> Result<CleanedBaseline, ValidationError> {
        let parts = &*self.parts;
        let Some(params) = raw.as_object() else {
            return Err(document_error(ValidationStage::Baseline, raw));
        };

        let mut sink = ViolationSink::new();
        let mut cleaned = CleanedBaseline::default();
        for (name, raw_param) in params {
            let Some(fragment) = parts.fragments.get(name) else {
                sink.push(
                    name,
                    None,
                    "<param>",
                    ViolationKind::UnknownParameter,
                    format!("`{name}` is not a parameter of this schema"),
                );
                continue;
            };
            if let Some(param) =
                fragment.clean_baseline(raw_param, &parts.fragments, &parts.options, &mut sink)
            {
                cleaned.params.insert(name.clone(), param);
            }
        }

        let violations = sink.len();
        sink.finish(ValidationStage::Baseline, parts.options.max_violations)
            .inspect_err(|_| warn!(violations, "baseline validation failed"))?;
        debug!(params = cleaned.len(), "baseline validated");
        Ok(cleaned)
    }
}

impl RevisionSchema {
    pub fn fragments(&self) -> &FragmentRegistry {
        &self.parts.fragments
    }

    /// Validate a revision document with `baseline` as context.
    ///
    /// Pass one cleans every entry. Pass two evaluates dimension bounds that
    /// reference parameters and the baseline's value rules, resolving
    /// references against the cleaned entries of both documents.
    pub fn load(
        &self,
        raw: &Value,
        baseline: &CleanedBaseline,
    ) -> Result<CleanedRevision, ValidationError> {
        let parts = &*self.parts;
        let Some(params) = raw.as_object() else {
            return Err(document_error(ValidationStage::Revision, raw));
        };

        let mut sink = ViolationSink::new();
        let mut indexed: BTreeMap<String, Vec<(usize, Entry)>> = BTreeMap::new();
        for (name, raw_param) in params {
            let Some(fragment) = parts
                .fragments
                .get(name)
                .filter(|_| baseline.contains(name))
            else {
                sink.push(
                    name,
                    None,
                    "<param>",
                    ViolationKind::UnknownParameter,
                    format!("`{name}` is not a parameter of the baseline"),
                );
                continue;
            };
            indexed.insert(name.clone(), fragment.clean_revision(raw_param, &mut sink));
        }

        let revision: BTreeMap<String, Vec<Entry>> = indexed
            .iter()
            .map(|(name, entries)| {
                (
                    name.clone(),
                    entries.iter().map(|(_, entry)| entry.clone()).collect(),
                )
            })
            .collect();
        let context = ValidationContext::new(baseline, &revision);

        for (name, entries) in &indexed {
            let rules = baseline.get(name).map(|p| p.rules()).unwrap_or(&[]);
            for (index, entry) in entries {
                let at = Some(*index);
                for (dim, label) in &entry.labels {
                    let Some(validator) = parts.dimensions.get(dim) else {
                        continue;
                    };
                    if !validator.has_references() {
                        continue;
                    }
                    let resolver = context.resolver(&entry.labels, Some(dim.as_str()));
                    for failure in validator.check(label, BoundMode::References(&resolver)) {
                        sink.push_failure(name, at, dim, failure, true);
                    }
                }

                if rules.is_empty() {
                    continue;
                }
                let resolver = context.resolver(&entry.labels, None);
                for rule in rules {
                    for failure in rule.check(name, &entry.value, BoundMode::All(&resolver)) {
                        sink.push_failure(name, at, "value", failure, false);
                    }
                }
            }
        }

        let violations = sink.len();
        sink.finish(ValidationStage::Revision, parts.options.max_violations)
            .inspect_err(|_| warn!(violations, "revision validation failed"))?;
        debug!(params = revision.len(), "revision validated");
        Ok(CleanedRevision { params: revision })
    }
}
