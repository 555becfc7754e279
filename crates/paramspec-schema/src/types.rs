//! Value model: field types, typed scalars, n-dimensional values, and
//! label-qualified entries.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

/// Date format accepted for `date` values and labels.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Semantic type used to pick a value or label validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Int,
    Float,
    Bool,
    Str,
    Date,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Str => "str",
            Self::Date => "date",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            "str" => Some(Self::Str),
            "date" => Some(Self::Date),
            _ => None,
        }
    }

    pub fn all() -> &'static [FieldType] {
        &[Self::Int, Self::Float, Self::Bool, Self::Str, Self::Date]
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Whether values of the two types can be ordered against each other.
    pub fn comparable_with(&self, other: FieldType) -> bool {
        (self.is_numeric() && other.is_numeric()) || *self == other
    }

    /// Common type of two inferred types. Only int/float widen.
    pub fn widen(self, other: FieldType) -> Option<FieldType> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Some(Self::Float),
            _ => None,
        }
    }

    /// Infer the type of a raw JSON leaf from its runtime representation.
    pub fn infer(raw: &Value, infer_dates: bool) -> Option<FieldType> {
        match raw {
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::Int),
            Value::Number(_) => Some(Self::Float),
            Value::String(s) => {
                if infer_dates && NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok() {
                    Some(Self::Date)
                } else {
                    Some(Self::Str)
                }
            }
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Coerce a raw JSON leaf into a typed scalar.
    pub fn coerce(&self, raw: &Value) -> Result<Scalar, CoercionError> {
        let mismatch = || CoercionError::TypeMismatch {
            expected: self.name(),
            found: describe_json(raw),
        };
        match self {
            Self::Int => match raw {
                Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        Ok(Scalar::Int(i))
                    } else {
                        match n.as_f64() {
                            Some(f)
                                if f.is_finite()
                                    && f.fract() == 0.0
                                    && f >= i64::MIN as f64
                                    && f <= i64::MAX as f64 =>
                            {
                                Ok(Scalar::Int(f as i64))
                            }
                            _ => Err(mismatch()),
                        }
                    }
                }
                Value::String(s) => {
                    s.trim().parse::<i64>().map(Scalar::Int).map_err(|_| mismatch())
                }
                _ => Err(mismatch()),
            },
            Self::Float => match raw {
                Value::Number(n) => n.as_f64().map(Scalar::Float).ok_or_else(mismatch),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(Scalar::Float(f)),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            Self::Bool => match raw {
                Value::Bool(b) => Ok(Scalar::Bool(*b)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Scalar::Bool(false)),
                    Some(1) => Ok(Scalar::Bool(true)),
                    _ => Err(mismatch()),
                },
                Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "yes" | "y" | "on" | "1" => Ok(Scalar::Bool(true)),
                    "false" | "f" | "no" | "n" | "off" | "0" => Ok(Scalar::Bool(false)),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            Self::Str => match raw {
                Value::String(s) => Ok(Scalar::Str(s.clone())),
                _ => Err(mismatch()),
            },
            Self::Date => match raw {
                Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
                    .map(Scalar::Date)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type names accepted by a schema: the built-ins plus declared aliases.
/// Aliases are consulted first, so they may shadow a built-in name.
#[derive(Debug, Clone, Default)]
pub struct TypeAliases {
    aliases: FxHashMap<String, FieldType>,
}

impl TypeAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: impl Into<String>, target: FieldType) {
        self.aliases.insert(alias.into(), target);
    }

    pub fn resolve(&self, name: &str) -> Option<FieldType> {
        self.aliases
            .get(name)
            .copied()
            .or_else(|| FieldType::from_name(name))
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Why a raw JSON value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoercionError {
    #[error("expected {expected}, got {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("expected a {expected}-dimensional array, got {found}")]
    DimsMismatch { expected: usize, found: String },
}

/// A typed scalar value or label.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
}

impl Scalar {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Int(_) => FieldType::Int,
            Self::Float(_) => FieldType::Float,
            Self::Bool(_) => FieldType::Bool,
            Self::Str(_) => FieldType::Str,
            Self::Date(_) => FieldType::Date,
        }
    }

    /// Ordering between two scalars; `None` when they are not comparable.
    /// Ints and floats compare numerically.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Bool(b) => Value::Bool(*b),
            Self::Str(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
        }
    }
}

/// A parameter value: a scalar, or a nested array of scalars when the
/// parameter declares `number_dims` > 0.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(Scalar),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Coerce a raw value with exactly `number_dims` levels of nesting.
    pub fn coerce(
        raw: &Value,
        field_type: FieldType,
        number_dims: usize,
    ) -> Result<ParamValue, CoercionError> {
        if number_dims == 0 {
            return field_type.coerce(raw).map(ParamValue::Scalar);
        }
        match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| ParamValue::coerce(item, field_type, number_dims - 1))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::Array),
            other => Err(CoercionError::DimsMismatch {
                expected: number_dims,
                found: describe_json(other),
            }),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    /// All scalars in the value, depth-first.
    pub fn leaves(&self) -> Vec<&Scalar> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Scalar>) {
        match self {
            Self::Scalar(s) => out.push(s),
            Self::Array(items) => items.iter().for_each(|i| i.collect_leaves(out)),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(s) => s.to_json(),
            Self::Array(items) => Value::Array(items.iter().map(ParamValue::to_json).collect()),
        }
    }
}

impl From<Scalar> for ParamValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Dimension name -> label. `BTreeMap` keeps label ordering canonical.
pub type LabelAssignment = BTreeMap<String, Scalar>;

/// Human-readable label assignment, e.g. `MARS=single, year=2020`.
pub fn describe_labels(labels: &LabelAssignment) -> String {
    if labels.is_empty() {
        return "<all labels>".to_string();
    }
    labels
        .iter()
        .map(|(dim, label)| format!("{dim}={label}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Key identifying a label assignment, used for duplicate detection.
pub(crate) fn label_key(labels: &LabelAssignment) -> String {
    labels
        .iter()
        .map(|(dim, label)| format!("{dim}\u{1f}{}\u{1f}{label}", label.field_type()))
        .collect::<Vec<_>>()
        .join("\u{1e}")
}

/// One label-qualified value of a parameter.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Entry {
    pub value: ParamValue,
    #[serde(flatten)]
    pub labels: LabelAssignment,
}

impl Entry {
    pub fn new(value: ParamValue, labels: LabelAssignment) -> Self {
        Self { value, labels }
    }

    pub fn unlabeled(value: ParamValue) -> Self {
        Self {
            value,
            labels: LabelAssignment::new(),
        }
    }

    /// Whether this entry applies to `labels`: every dimension assigned in
    /// `labels` (other than `exclude`) is either unassigned here or carries
    /// the same label.
    pub fn applies_to(&self, labels: &LabelAssignment, exclude: Option<&str>) -> bool {
        labels.iter().all(|(dim, label)| {
            if exclude == Some(dim.as_str()) {
                return true;
            }
            match self.labels.get(dim) {
                None => true,
                Some(own) => own.compare(label) == Some(Ordering::Equal),
            }
        })
    }

    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("value".to_string(), self.value.to_json());
        for (dim, label) in &self.labels {
            map.insert(dim.clone(), label.to_json());
        }
        Value::Object(map)
    }
}

/// Short description of a raw JSON value for error messages.
pub(crate) fn describe_json(raw: &Value) -> String {
    match raw {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string \"{s}\""),
        Value::Array(items) => format!("array of {} item(s)", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}
