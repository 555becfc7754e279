//! A single dimension's label validator.

use serde_json::Value;

use crate::rules::{BoundMode, Rule, RuleFailure, RuleSet};
use crate::types::{CoercionError, FieldType, ParamValue, Scalar};

/// Validates the labels one dimension may take.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionValidator {
    name: String,
    label_type: FieldType,
    rules: RuleSet,
}

impl DimensionValidator {
    pub fn new(name: impl Into<String>, label_type: FieldType, rules: RuleSet) -> Self {
        Self {
            name: name.into(),
            label_type,
            rules,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_type(&self) -> FieldType {
        self.label_type
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Coerce a raw label to the dimension's type.
    pub fn coerce(&self, raw: &Value) -> Result<Scalar, CoercionError> {
        self.label_type.coerce(raw)
    }

    /// Whether `label` passes every literal rule. Reference bounds need a
    /// baseline to resolve against and are not considered here.
    pub fn validate(&self, label: &Scalar) -> bool {
        label.field_type() == self.label_type && self.check(label, BoundMode::Literals).is_empty()
    }

    /// Check `label` and report every failed rule.
    pub fn check(&self, label: &Scalar, mode: BoundMode<'_>) -> Vec<RuleFailure> {
        let subject = format!("{} label", self.name);
        let value = ParamValue::Scalar(label.clone());
        self.rules
            .iter()
            .flat_map(|rule| rule.check(&subject, &value, mode))
            .collect()
    }

    pub fn has_references(&self) -> bool {
        self.rules.iter().any(Rule::has_references)
    }

    /// Parameter names referenced by this dimension's bounds.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().flat_map(Rule::references)
    }

    /// Constraint summary, e.g. `year: int, range(min=2013, max=2027)`.
    pub fn describe(&self) -> String {
        let mut out = format!("{}: {}", self.name, self.label_type);
        for rule in &self.rules {
            out.push_str(", ");
            out.push_str(&rule.describe());
        }
        out
    }
}
