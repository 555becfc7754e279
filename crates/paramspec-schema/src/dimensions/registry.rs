//! Dimension validator registry, built once from the schema definition.

use paramspec_core::errors::DimensionDefinitionError;
use rustc_hash::FxHashMap;

use super::DimensionValidator;
use crate::definition::SchemaDefinition;
use crate::rules::{parse_rules, ReferencePolicy, RuleParseError};
use crate::types::TypeAliases;

/// Name -> validator for every declared dimension.
#[derive(Debug, Clone, Default)]
pub struct DimensionRegistry {
    validators: FxHashMap<String, DimensionValidator>,
    /// Dimension names in sorted order, for deterministic iteration.
    order: Vec<String>,
}

impl DimensionRegistry {
    /// Build the registry. Fails on unknown types or validator kinds and on
    /// self-contradictory bounds. Range bounds that do not coerce to the
    /// dimension type are kept as parameter references; whether the
    /// referenced parameters exist is checked at compile time.
    pub fn from_definition(
        definition: &SchemaDefinition,
        aliases: &TypeAliases,
    ) -> Result<Self, DimensionDefinitionError> {
        let mut registry = Self::default();
        for (name, def) in &definition.dims {
            let label_type = aliases.resolve(&def.type_name).ok_or_else(|| {
                DimensionDefinitionError::UnknownType {
                    dimension: name.clone(),
                    type_name: def.type_name.clone(),
                }
            })?;
            let validators = serde_json::Value::Object(def.validators.clone());
            let rules = parse_rules(&validators, label_type, ReferencePolicy::Uncoercible)
                .map_err(|e| dimension_error(name, e))?;
            registry.insert(DimensionValidator::new(name.clone(), label_type, rules));
        }
        Ok(registry)
    }

    /// Register a validator, replacing any previous one with the same name.
    pub fn insert(&mut self, validator: DimensionValidator) {
        let name = validator.name().to_string();
        if self.validators.insert(name.clone(), validator).is_none() {
            let pos = self.order.binary_search(&name).unwrap_or_else(|p| p);
            self.order.insert(pos, name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&DimensionValidator> {
        self.validators.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &DimensionValidator> {
        self.order.iter().filter_map(|n| self.validators.get(n))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(dimension, parameter)` for every parameter reference in a bound.
    pub fn references(&self) -> Vec<(&str, &str)> {
        self.iter()
            .flat_map(|v| v.references().map(move |p| (v.name(), p)))
            .collect()
    }
}

fn dimension_error(dimension: &str, err: RuleParseError) -> DimensionDefinitionError {
    let dimension = dimension.to_string();
    match err {
        RuleParseError::UnknownKind(kind) => {
            DimensionDefinitionError::UnknownValidatorKind { dimension, kind }
        }
        RuleParseError::InvalidBounds { min, max } => {
            DimensionDefinitionError::InvalidBounds { dimension, min, max }
        }
        other => DimensionDefinitionError::InvalidParameters {
            dimension,
            message: other.to_string(),
        },
    }
}
