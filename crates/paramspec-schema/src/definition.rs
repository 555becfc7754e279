//! Schema definition document: dimensions, optional metadata params, and
//! type aliases.

use std::collections::BTreeMap;

use paramspec_core::errors::CompileError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{FieldType, TypeAliases};

/// Declaration of one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    #[serde(rename = "type")]
    pub type_name: String,
    /// `{ kind: params }`, e.g. `{ "range": { "min": 2013, "max": 2027 } }`.
    #[serde(default)]
    pub validators: Map<String, Value>,
}

/// Declaration of an optional metadata field on parameter objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalParamDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub number_dims: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(default)]
    pub schema_name: Option<String>,
    #[serde(default, alias = "dimensions")]
    pub dims: BTreeMap<String, DimensionDef>,
    #[serde(default, alias = "param_defaults")]
    pub optional_params: BTreeMap<String, OptionalParamDef>,
    /// Custom type name -> built-in type name.
    #[serde(default)]
    pub type_aliases: BTreeMap<String, String>,
}

/// Optional metadata fields with their resolved types.
pub type OptionalParams = BTreeMap<String, (FieldType, usize)>;

/// Keys of a parameter metadata object that are always allowed.
pub(crate) const RESERVED_PARAM_KEYS: &[&str] = &[
    "title",
    "description",
    "notes",
    "type",
    "number_dims",
    "value",
    "validators",
];

impl SchemaDefinition {
    pub fn from_value(raw: &Value) -> Result<Self, CompileError> {
        Self::deserialize(raw).map_err(|e| CompileError::InvalidDefinition(e.to_string()))
    }

    /// Build the alias table. Every alias must target a built-in type.
    pub fn type_aliases(&self) -> Result<TypeAliases, CompileError> {
        let mut aliases = TypeAliases::new();
        for (alias, target) in &self.type_aliases {
            let field_type = FieldType::from_name(target).ok_or_else(|| {
                CompileError::InvalidDefinition(format!(
                    "type alias `{alias}` targets unknown type `{target}`"
                ))
            })?;
            aliases.insert(alias.clone(), field_type);
        }
        Ok(aliases)
    }

    /// Resolve the optional metadata params against the alias table.
    pub fn optional_params(&self, aliases: &TypeAliases) -> Result<OptionalParams, CompileError> {
        self.optional_params
            .iter()
            .map(|(name, def)| {
                if RESERVED_PARAM_KEYS.contains(&name.as_str()) {
                    return Err(CompileError::InvalidDefinition(format!(
                        "optional param `{name}` shadows a reserved key"
                    )));
                }
                let field_type = aliases.resolve(&def.type_name).ok_or_else(|| {
                    CompileError::InvalidDefinition(format!(
                        "optional param `{name}` has unknown type `{}`",
                        def.type_name
                    ))
                })?;
                Ok((name.clone(), (field_type, def.number_dims)))
            })
            .collect()
    }
}
