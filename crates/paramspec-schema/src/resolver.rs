//! Type resolution: maps a raw baseline parameter to the field type,
//! nesting depth, and shape its validators are built from.
//!
//! A declared `type` on a metadata object always wins. Otherwise the type is
//! inferred from the runtime representation of the value, looking through
//! `{ "value": ... }` wrappers. Integer and float entries widen to float;
//! any other disagreement between entries is ambiguous.

use paramspec_core::errors::TypeResolutionError;
use serde_json::{Map, Value};

use crate::types::{FieldType, TypeAliases};

/// Whether a parameter holds one unlabeled value or a list of
/// label-qualified entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Single,
    Sequence,
}

/// Outcome of resolving one baseline parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedType {
    pub field_type: FieldType,
    pub number_dims: usize,
    pub shape: Shape,
    /// True when the type came from an explicit `type` key.
    pub declared: bool,
}

/// Resolve the field type of a raw baseline parameter.
pub fn resolve_type(
    raw: &Value,
    aliases: &TypeAliases,
    infer_dates: bool,
) -> Result<ResolvedType, TypeResolutionError> {
    match raw {
        Value::Object(map) => resolve_object(map, aliases, infer_dates),
        other => infer_value(other, infer_dates),
    }
}

fn resolve_object(
    map: &Map<String, Value>,
    aliases: &TypeAliases,
    infer_dates: bool,
) -> Result<ResolvedType, TypeResolutionError> {
    let value = map.get("value").ok_or(TypeResolutionError::MissingValue)?;

    let Some(declared) = map.get("type") else {
        return infer_value(value, infer_dates);
    };
    let name = declared
        .as_str()
        .ok_or_else(|| TypeResolutionError::UnsupportedValue {
            detail: "`type` must be a string".to_string(),
        })?;
    let field_type = aliases
        .resolve(name)
        .ok_or_else(|| TypeResolutionError::UnknownTypeName {
            name: name.to_string(),
        })?;
    let number_dims = match map.get("number_dims") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| TypeResolutionError::UnsupportedValue {
                detail: "`number_dims` must be a non-negative integer".to_string(),
            })? as usize,
    };

    Ok(ResolvedType {
        field_type,
        number_dims,
        shape: shape_of(value, number_dims)?,
        declared: true,
    })
}

/// Shape of a value whose element type is already known.
pub(crate) fn shape_of(value: &Value, number_dims: usize) -> Result<Shape, TypeResolutionError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(if number_dims == 0 {
            Shape::Sequence
        } else {
            Shape::Single
        }),
        Value::Array(items) => {
            let objects = items.iter().filter(|i| i.is_object()).count();
            if objects == items.len() {
                Ok(Shape::Sequence)
            } else if objects == 0 {
                Ok(Shape::Single)
            } else {
                Err(TypeResolutionError::UnsupportedValue {
                    detail: "array mixes entry objects and plain values".to_string(),
                })
            }
        }
        _ => Ok(Shape::Single),
    }
}

fn infer_value(value: &Value, infer_dates: bool) -> Result<ResolvedType, TypeResolutionError> {
    let Value::Array(items) = value else {
        let (field_type, number_dims) = infer_tree(value, infer_dates)?;
        return Ok(ResolvedType {
            field_type,
            number_dims,
            shape: Shape::Single,
            declared: false,
        });
    };

    if items.is_empty() {
        return Err(TypeResolutionError::EmptyValue);
    }

    match shape_of(value, 0)? {
        Shape::Single => {
            let (field_type, number_dims) = infer_tree(value, infer_dates)?;
            Ok(ResolvedType {
                field_type,
                number_dims,
                shape: Shape::Single,
                declared: false,
            })
        }
        Shape::Sequence => {
            let mut resolved: Option<(FieldType, usize)> = None;
            for item in items {
                let inner = item.get("value").ok_or(TypeResolutionError::MissingValue)?;
                let (field_type, number_dims) = infer_tree(inner, infer_dates)?;
                resolved = Some(match resolved {
                    None => (field_type, number_dims),
                    Some(prev) => merge(prev, (field_type, number_dims))?,
                });
            }
            let (field_type, number_dims) = resolved.ok_or(TypeResolutionError::EmptyValue)?;
            Ok(ResolvedType {
                field_type,
                number_dims,
                shape: Shape::Sequence,
                declared: false,
            })
        }
    }
}

/// Infer the leaf type and nesting depth of a plain (non-entry) value.
fn infer_tree(value: &Value, infer_dates: bool) -> Result<(FieldType, usize), TypeResolutionError> {
    match value {
        Value::Null => Err(TypeResolutionError::EmptyValue),
        Value::Object(_) => Err(TypeResolutionError::UnsupportedValue {
            detail: "object where a plain value was expected".to_string(),
        }),
        Value::Array(items) => {
            let mut resolved: Option<(FieldType, usize)> = None;
            for item in items {
                let found = infer_tree(item, infer_dates)?;
                resolved = Some(match resolved {
                    None => found,
                    Some(prev) => merge(prev, found)?,
                });
            }
            let (field_type, depth) = resolved.ok_or(TypeResolutionError::EmptyValue)?;
            Ok((field_type, depth + 1))
        }
        leaf => FieldType::infer(leaf, infer_dates)
            .map(|t| (t, 0))
            .ok_or_else(|| TypeResolutionError::UnsupportedValue {
                detail: format!("cannot infer a type from {leaf}"),
            }),
    }
}

fn merge(
    (a_type, a_dims): (FieldType, usize),
    (b_type, b_dims): (FieldType, usize),
) -> Result<(FieldType, usize), TypeResolutionError> {
    if a_dims != b_dims {
        return Err(TypeResolutionError::InconsistentDims {
            expected: a_dims,
            found: b_dims,
        });
    }
    let field_type = a_type
        .widen(b_type)
        .ok_or_else(|| TypeResolutionError::AmbiguousType {
            first: a_type.name().to_string(),
            second: b_type.name().to_string(),
        })?;
    Ok((field_type, a_dims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(raw: Value) -> Result<ResolvedType, TypeResolutionError> {
        resolve_type(&raw, &TypeAliases::new(), true)
    }

    #[test]
    fn plain_scalars() {
        assert_eq!(resolve(json!(3)).unwrap().field_type, FieldType::Int);
        assert_eq!(resolve(json!(3.5)).unwrap().field_type, FieldType::Float);
        assert_eq!(resolve(json!(true)).unwrap().field_type, FieldType::Bool);
        assert_eq!(resolve(json!("abc")).unwrap().field_type, FieldType::Str);
        assert_eq!(resolve(json!("2024-01-31")).unwrap().field_type, FieldType::Date);
        assert_eq!(resolve(json!(3)).unwrap().shape, Shape::Single);
    }

    #[test]
    fn date_inference_can_be_disabled() {
        let r = resolve_type(&json!("2024-01-31"), &TypeAliases::new(), false).unwrap();
        assert_eq!(r.field_type, FieldType::Str);
    }

    #[test]
    fn entries_widen_int_to_float() {
        let r = resolve(json!([{"value": 1, "year": 2020}, {"value": 1.5, "year": 2021}])).unwrap();
        assert_eq!(r.field_type, FieldType::Float);
        assert_eq!(r.shape, Shape::Sequence);
        assert!(!r.declared);
    }

    #[test]
    fn disagreeing_entries_are_ambiguous() {
        let err = resolve(json!([{"value": 1}, {"value": "x"}])).unwrap_err();
        assert!(matches!(err, TypeResolutionError::AmbiguousType { .. }));
    }

    #[test]
    fn empty_sequence_is_an_error() {
        assert_eq!(resolve(json!([])).unwrap_err(), TypeResolutionError::EmptyValue);
        assert_eq!(resolve(json!(null)).unwrap_err(), TypeResolutionError::EmptyValue);
    }

    #[test]
    fn declared_type_wins_over_representation() {
        let raw = json!({"type": "float", "value": [{"value": "10", "year": 2020}]});
        let r = resolve(raw).unwrap();
        assert_eq!(r.field_type, FieldType::Float);
        assert!(r.declared);
    }

    #[test]
    fn declared_type_allows_empty_sequence() {
        let r = resolve(json!({"type": "int", "value": []})).unwrap();
        assert_eq!(r.shape, Shape::Sequence);
    }

    #[test]
    fn aliases_resolve_declared_names() {
        let mut aliases = TypeAliases::new();
        aliases.insert("money", FieldType::Float);
        let r = resolve_type(&json!({"type": "money", "value": 1}), &aliases, true).unwrap();
        assert_eq!(r.field_type, FieldType::Float);
    }

    #[test]
    fn nested_arrays_count_dims() {
        let r = resolve(json!([[1, 2], [3, 4]])).unwrap();
        assert_eq!((r.field_type, r.number_dims, r.shape), (FieldType::Int, 2, Shape::Single));

        let r = resolve(json!([{"value": [1.0, 2.0]}])).unwrap();
        assert_eq!((r.number_dims, r.shape), (1, Shape::Sequence));
    }

    #[test]
    fn metadata_without_value_is_rejected() {
        assert_eq!(
            resolve(json!({"title": "x"})).unwrap_err(),
            TypeResolutionError::MissingValue
        );
    }
}
