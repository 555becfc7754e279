//! Normalized outputs of validation.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::resolver::Shape;
use crate::rules::{rules_to_json, Rule, RuleSet};
use crate::types::{Entry, FieldType, ParamValue};

/// Documentation and optional metadata carried by a parameter object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Declared optional metadata fields, coerced to their schema types.
    pub extra: BTreeMap<String, ParamValue>,
    /// Whether the parameter was written as a metadata object.
    pub is_object: bool,
}

/// One validated baseline parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedParam {
    pub value_type: FieldType,
    pub number_dims: usize,
    pub shape: Shape,
    pub meta: ParamMeta,
    /// Value validators applied to revisions of this parameter.
    pub rules: RuleSet,
    pub entries: Vec<Entry>,
}

impl CleanedParam {
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn to_json(&self) -> Value {
        let value = match self.shape {
            Shape::Single => self
                .entries
                .first()
                .map(|e| e.value.to_json())
                .unwrap_or(Value::Null),
            Shape::Sequence => Value::Array(self.entries.iter().map(Entry::to_json).collect()),
        };
        if !self.meta.is_object {
            return value;
        }

        let mut map = Map::new();
        if let Some(title) = &self.meta.title {
            map.insert("title".to_string(), Value::String(title.clone()));
        }
        if let Some(description) = &self.meta.description {
            map.insert("description".to_string(), Value::String(description.clone()));
        }
        if let Some(notes) = &self.meta.notes {
            map.insert("notes".to_string(), Value::String(notes.clone()));
        }
        map.insert("type".to_string(), Value::String(self.value_type.name().to_string()));
        map.insert("number_dims".to_string(), Value::from(self.number_dims));
        for (key, extra) in &self.meta.extra {
            map.insert(key.clone(), extra.to_json());
        }
        if !self.rules.is_empty() {
            map.insert("validators".to_string(), rules_to_json(&self.rules));
        }
        map.insert("value".to_string(), value);
        Value::Object(map)
    }
}

/// The baseline after validation. Immutable; used read-only as context for
/// revision validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedBaseline {
    pub(crate) params: BTreeMap<String, CleanedParam>,
}

impl CleanedBaseline {
    pub fn get(&self, param: &str) -> Option<&CleanedParam> {
        self.params.get(param)
    }

    /// Entries of `param`; empty when the baseline does not contain it.
    pub fn entries(&self, param: &str) -> &[Entry] {
        self.params
            .get(param)
            .map(|p| p.entries.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, param: &str) -> bool {
        self.params.contains_key(param)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CleanedParam)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.params
                .iter()
                .map(|(name, param)| (name.clone(), param.to_json()))
                .collect(),
        )
    }
}

/// A validated revision: parameter -> proposed entries.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct CleanedRevision {
    pub(crate) params: BTreeMap<String, Vec<Entry>>,
}

impl CleanedRevision {
    pub fn get(&self, param: &str) -> Option<&[Entry]> {
        self.params.get(param).map(Vec::as_slice)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.params
                .iter()
                .map(|(name, entries)| {
                    (
                        name.clone(),
                        Value::Array(entries.iter().map(Entry::to_json).collect()),
                    )
                })
                .collect(),
        )
    }
}
