//! `SchemaBuilder`: load a schema definition and baseline, compile once,
//! then validate any number of revisions.

use std::path::Path;

use paramspec_core::config::ParamSpecConfig;
use paramspec_core::errors::BuilderError;
use paramspec_core::tracing::init_tracing_from_config;
use serde_json::Value;
use tracing::debug;

use crate::cleaned::{CleanedBaseline, CleanedRevision};
use crate::compiler::CompileOptions;
use crate::engine::{compile, CompiledSchemas};
use crate::loader::{read_json, ParamsInput};

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema_def: Value,
    baseline: Value,
    config: ParamSpecConfig,
    compiled: Option<CompiledSchemas>,
    cleaned: Option<CleanedBaseline>,
}

impl SchemaBuilder {
    pub fn new(schema_def: Value, baseline: Value) -> Self {
        Self {
            schema_def,
            baseline,
            config: ParamSpecConfig::default(),
            compiled: None,
            cleaned: None,
        }
    }

    /// Read both documents from JSON files.
    pub fn from_paths(
        schema_def_path: impl AsRef<Path>,
        base_spec_path: impl AsRef<Path>,
    ) -> Result<Self, BuilderError> {
        let schema_def = read_json(schema_def_path.as_ref())?;
        let baseline = read_json(base_spec_path.as_ref())?;
        Ok(Self::new(schema_def, baseline))
    }

    /// Replace the configuration. Discards anything already built.
    pub fn with_config(mut self, config: ParamSpecConfig) -> Self {
        self.config = config;
        self.compiled = None;
        self.cleaned = None;
        self
    }

    pub fn config(&self) -> &ParamSpecConfig {
        &self.config
    }

    /// Install the tracing subscriber using this builder's `[logging]` filter.
    /// Only the first initialization in a process takes effect.
    pub fn init_tracing(&self) {
        init_tracing_from_config(&self.config.logging);
    }

    /// Compile the schemas and validate the baseline. Both steps run once;
    /// later calls return the cached cleaned baseline.
    pub fn build_schemas(&mut self) -> Result<&CleanedBaseline, BuilderError> {
        if self.cleaned.is_none() {
            let compiled = match self.compiled.take() {
                Some(compiled) => compiled,
                None => {
                    let options = CompileOptions::from(&self.config.validation);
                    compile(&self.schema_def, &self.baseline, &options)?
                }
            };
            // A compiled schema survives a failed baseline validation.
            let result = compiled.validate_baseline(&self.baseline);
            self.compiled = Some(compiled);
            self.cleaned = Some(result?);
            debug!("schemas built");
        }
        self.cleaned.as_ref().ok_or(BuilderError::NotBuilt)
    }

    /// Validate a revision against the cleaned baseline.
    pub fn load_params(
        &self,
        input: impl Into<ParamsInput>,
    ) -> Result<CleanedRevision, BuilderError> {
        let (Some(compiled), Some(cleaned)) = (&self.compiled, &self.cleaned) else {
            return Err(BuilderError::NotBuilt);
        };
        let raw = input.into().into_value()?;
        Ok(compiled.validate_revision(&raw, cleaned)?)
    }

    pub fn compiled(&self) -> Option<&CompiledSchemas> {
        self.compiled.as_ref()
    }

    pub fn cleaned_baseline(&self) -> Option<&CleanedBaseline> {
        self.cleaned.as_ref()
    }
}
