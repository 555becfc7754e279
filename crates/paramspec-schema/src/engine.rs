//! Context-aware validation engine.
//!
//! [`compile`] runs once and publishes an immutable [`CompiledSchemas`]:
//! nothing is returned unless every dimension and parameter compiled. After
//! that, `validate_baseline` and `validate_revision` may be called any number
//! of times, from any number of threads. Each call owns its results and its
//! context; the cleaned baseline a revision is checked against is always
//! passed in explicitly.

use std::sync::Arc;

use paramspec_core::errors::{CompileError, ValidationError};
use serde_json::Value;
use tracing::info;

use crate::aggregate::{aggregate, BaselineSchema, RevisionSchema};
use crate::cleaned::{CleanedBaseline, CleanedRevision};
use crate::compiler::{compile_fragments, CompileOptions, FragmentRegistry};
use crate::definition::SchemaDefinition;
use crate::dimensions::DimensionRegistry;

/// The published pair of schemas.
#[derive(Debug, Clone)]
pub struct CompiledSchemas {
    baseline: BaselineSchema,
    revision: RevisionSchema,
}

/// Compile a raw schema definition and baseline spec.
pub fn compile(
    schema_definition: &Value,
    baseline_spec: &Value,
    options: &CompileOptions,
) -> Result<CompiledSchemas, CompileError> {
    let definition = SchemaDefinition::from_value(schema_definition)?;
    compile_definition(&definition, baseline_spec, options)
}

/// Compile an already-decoded schema definition and a baseline spec.
pub fn compile_definition(
    definition: &SchemaDefinition,
    baseline_spec: &Value,
    options: &CompileOptions,
) -> Result<CompiledSchemas, CompileError> {
    let aliases = definition.type_aliases()?;
    let dimensions = Arc::new(DimensionRegistry::from_definition(definition, &aliases)?);
    let fragments = compile_fragments(definition, Arc::clone(&dimensions), baseline_spec, options)?;

    info!(
        schema = definition.schema_name.as_deref().unwrap_or("<unnamed>"),
        dimensions = dimensions.len(),
        params = fragments.len(),
        "compiled parameter schemas"
    );

    let (baseline, revision) = aggregate(fragments, dimensions, *options);
    Ok(CompiledSchemas { baseline, revision })
}

impl CompiledSchemas {
    /// Validate a full baseline document.
    pub fn validate_baseline(&self, raw: &Value) -> Result<CleanedBaseline, ValidationError> {
        self.baseline.load(raw)
    }

    /// Validate a revision against a cleaned baseline produced by
    /// [`validate_baseline`](Self::validate_baseline).
    pub fn validate_revision(
        &self,
        raw: &Value,
        baseline: &CleanedBaseline,
    ) -> Result<CleanedRevision, ValidationError> {
        self.revision.load(raw, baseline)
    }

    pub fn baseline_schema(&self) -> &BaselineSchema {
        &self.baseline
    }

    pub fn revision_schema(&self) -> &RevisionSchema {
        &self.revision
    }

    pub fn fragments(&self) -> &FragmentRegistry {
        self.baseline.fragments()
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        self.baseline.dimensions()
    }
}
