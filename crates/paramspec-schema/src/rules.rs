//! Validator rules shared by dimensions and parameter values.
//!
//! A rule is one of a closed set of kinds (`range`, `date_range`,
//! `choice`). Range bounds are either literals or references to another
//! parameter's value, resolved per entry through a [`BoundResolver`].

use std::cmp::Ordering;

use paramspec_core::errors::ViolationKind;
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::types::{describe_labels, FieldType, LabelAssignment, ParamValue, Scalar};

/// Rules attached to one dimension or parameter.
pub type RuleSet = SmallVec<[Rule; 2]>;

/// The closed set of validator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Range,
    DateRange,
    Choice,
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Range => "range",
            Self::DateRange => "date_range",
            Self::Choice => "choice",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "range" => Some(Self::Range),
            "date_range" => Some(Self::DateRange),
            "choice" => Some(Self::Choice),
            _ => None,
        }
    }
}

/// One side of a range.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Literal(Scalar),
    /// The value of the named parameter at the same label assignment.
    Reference(String),
}

impl Bound {
    fn to_json(&self) -> Value {
        match self {
            Self::Literal(s) => s.to_json(),
            Self::Reference(p) => Value::String(p.clone()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Literal(s) => s.to_string(),
            Self::Reference(p) => format!("`{p}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeRule {
    pub min: Option<Bound>,
    pub max: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceRule {
    pub choices: Vec<Scalar>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Range(RangeRule),
    DateRange(RangeRule),
    Choice(ChoiceRule),
}

/// How string bounds are told apart from literal values while parsing.
#[derive(Clone, Copy)]
pub enum ReferencePolicy<'a> {
    /// A string naming a known parameter is a reference.
    KnownParams(&'a dyn Fn(&str) -> bool),
    /// A string that does not coerce to the field type is a reference.
    Uncoercible,
}

/// Problems in a validator declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleParseError {
    #[error("unknown validator kind `{0}`")]
    UnknownKind(String),

    #[error("`{kind}` is not applicable to {field_type} values")]
    WrongType { kind: &'static str, field_type: FieldType },

    #[error("{0}")]
    InvalidParameters(String),

    #[error("min {min} is greater than max {max}")]
    InvalidBounds { min: String, max: String },
}

/// A candidate value for a reference bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedValue {
    pub labels: LabelAssignment,
    pub value: ParamValue,
}

/// Looks up the values a reference bound points at for one entry.
pub trait BoundResolver {
    /// Every value of `param` applicable to the entry being checked, or a
    /// message explaining why there is none.
    fn resolve(&self, param: &str) -> Result<Vec<ResolvedValue>, String>;
}

/// Which bounds a check evaluates.
#[derive(Clone, Copy)]
pub enum BoundMode<'a> {
    /// Literal bounds and choices only; references are skipped.
    Literals,
    /// Reference bounds only.
    References(&'a dyn BoundResolver),
    /// Everything.
    All(&'a dyn BoundResolver),
}

impl<'a> BoundMode<'a> {
    fn literals(&self) -> bool {
        matches!(self, Self::Literals | Self::All(_))
    }

    fn resolver(&self) -> Option<&'a dyn BoundResolver> {
        match self {
            Self::Literals => None,
            Self::References(r) | Self::All(r) => Some(*r),
        }
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFailure {
    pub kind: ViolationKind,
    pub message: String,
}

impl RuleFailure {
    fn new(kind: ViolationKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// Parse a `validators` object (`{ kind: params, ... }`) into rules.
pub fn parse_rules(
    validators: &Value,
    field_type: FieldType,
    policy: ReferencePolicy<'_>,
) -> Result<RuleSet, RuleParseError> {
    let map = validators.as_object().ok_or_else(|| {
        RuleParseError::InvalidParameters("validators must be an object".to_string())
    })?;
    map.iter()
        .map(|(kind, params)| Rule::parse(kind, params, field_type, policy))
        .collect()
}

impl Rule {
    pub fn parse(
        kind: &str,
        params: &Value,
        field_type: FieldType,
        policy: ReferencePolicy<'_>,
    ) -> Result<Rule, RuleParseError> {
        let kind_tag =
            RuleKind::from_name(kind).ok_or_else(|| RuleParseError::UnknownKind(kind.to_string()))?;
        let params = params.as_object().ok_or_else(|| {
            RuleParseError::InvalidParameters(format!("`{kind}` parameters must be an object"))
        })?;

        match kind_tag {
            RuleKind::Range => {
                if !(field_type.is_numeric() || field_type == FieldType::Date) {
                    return Err(RuleParseError::WrongType {
                        kind: kind_tag.name(),
                        field_type,
                    });
                }
                parse_range(kind_tag, params, field_type, policy).map(Rule::Range)
            }
            RuleKind::DateRange => {
                if field_type != FieldType::Date {
                    return Err(RuleParseError::WrongType {
                        kind: kind_tag.name(),
                        field_type,
                    });
                }
                parse_range(kind_tag, params, field_type, policy).map(Rule::DateRange)
            }
            RuleKind::Choice => parse_choice(params, field_type).map(Rule::Choice),
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Range(_) => RuleKind::Range,
            Self::DateRange(_) => RuleKind::DateRange,
            Self::Choice(_) => RuleKind::Choice,
        }
    }

    /// Names of parameters this rule's bounds refer to.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        let (min, max) = match self {
            Self::Range(r) | Self::DateRange(r) => (r.min.as_ref(), r.max.as_ref()),
            Self::Choice(_) => (None, None),
        };
        [min, max].into_iter().flatten().filter_map(|b| match b {
            Bound::Reference(p) => Some(p.as_str()),
            Bound::Literal(_) => None,
        })
    }

    pub fn has_references(&self) -> bool {
        self.references().next().is_some()
    }

    /// Check `value` against this rule. `subject` names what is being
    /// checked in failure messages.
    pub fn check(
        &self,
        subject: &str,
        value: &ParamValue,
        mode: BoundMode<'_>,
    ) -> Vec<RuleFailure> {
        match self {
            Self::Range(r) | Self::DateRange(r) => check_range(r, subject, value, mode),
            Self::Choice(c) => {
                if mode.literals() {
                    check_choice(c, subject, value)
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Range(r) | Self::DateRange(r) => {
                let mut parts = Vec::new();
                if let Some(min) = &r.min {
                    parts.push(format!("min={}", min.describe()));
                }
                if let Some(max) = &r.max {
                    parts.push(format!("max={}", max.describe()));
                }
                format!("{}({})", self.kind().name(), parts.join(", "))
            }
            Self::Choice(c) => format!("choice({})", join_scalars(&c.choices)),
        }
    }

    /// `(kind, params)` in declaration format.
    pub fn to_json(&self) -> (String, Value) {
        let mut params = Map::new();
        match self {
            Self::Range(r) | Self::DateRange(r) => {
                if let Some(min) = &r.min {
                    params.insert("min".to_string(), min.to_json());
                }
                if let Some(max) = &r.max {
                    params.insert("max".to_string(), max.to_json());
                }
            }
            Self::Choice(c) => {
                params.insert(
                    "choices".to_string(),
                    Value::Array(c.choices.iter().map(Scalar::to_json).collect()),
                );
            }
        }
        (self.kind().name().to_string(), Value::Object(params))
    }
}

/// Render a rule set back to a `validators` object.
pub fn rules_to_json(rules: &[Rule]) -> Value {
    Value::Object(rules.iter().map(Rule::to_json).collect())
}

fn parse_range(
    kind: RuleKind,
    params: &Map<String, Value>,
    field_type: FieldType,
    policy: ReferencePolicy<'_>,
) -> Result<RangeRule, RuleParseError> {
    if let Some(key) = params.keys().find(|k| *k != "min" && *k != "max") {
        return Err(RuleParseError::InvalidParameters(format!(
            "`{}` accepts only `min` and `max`, found `{key}`",
            kind.name()
        )));
    }
    let rule = RangeRule {
        min: parse_bound(params.get("min"), field_type, policy)?,
        max: parse_bound(params.get("max"), field_type, policy)?,
    };
    if let (Some(Bound::Literal(min)), Some(Bound::Literal(max))) = (&rule.min, &rule.max) {
        if min.compare(max) == Some(Ordering::Greater) {
            return Err(RuleParseError::InvalidBounds {
                min: min.to_string(),
                max: max.to_string(),
            });
        }
    }
    Ok(rule)
}

fn parse_bound(
    raw: Option<&Value>,
    field_type: FieldType,
    policy: ReferencePolicy<'_>,
) -> Result<Option<Bound>, RuleParseError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(raw) => raw,
    };
    if let (Value::String(s), ReferencePolicy::KnownParams(known)) = (raw, policy) {
        if known(s.as_str()) {
            return Ok(Some(Bound::Reference(s.clone())));
        }
    }
    match field_type.coerce(raw) {
        Ok(literal) => Ok(Some(Bound::Literal(literal))),
        Err(_) if raw.is_string() && matches!(policy, ReferencePolicy::Uncoercible) => {
            Ok(raw.as_str().map(|s| Bound::Reference(s.to_string())))
        }
        Err(e) => Err(RuleParseError::InvalidParameters(format!("invalid bound: {e}"))),
    }
}

fn parse_choice(
    params: &Map<String, Value>,
    field_type: FieldType,
) -> Result<ChoiceRule, RuleParseError> {
    if let Some(key) = params.keys().find(|k| *k != "choices") {
        return Err(RuleParseError::InvalidParameters(format!(
            "`choice` accepts only `choices`, found `{key}`"
        )));
    }
    let raw = params
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RuleParseError::InvalidParameters("`choice` requires a `choices` list".to_string())
        })?;
    if raw.is_empty() {
        return Err(RuleParseError::InvalidParameters(
            "`choices` must not be empty".to_string(),
        ));
    }
    let choices = raw
        .iter()
        .map(|c| field_type.coerce(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RuleParseError::InvalidParameters(format!("invalid choice: {e}")))?;
    Ok(ChoiceRule { choices })
}

fn check_choice(rule: &ChoiceRule, subject: &str, value: &ParamValue) -> Vec<RuleFailure> {
    value
        .leaves()
        .into_iter()
        .filter(|leaf| {
            !rule
                .choices
                .iter()
                .any(|c| c.compare(leaf) == Some(Ordering::Equal))
        })
        .map(|leaf| {
            RuleFailure::new(
                ViolationKind::InvalidChoice,
                format!("{subject} {leaf} must be one of [{}]", join_scalars(&rule.choices)),
            )
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Min,
    Max,
}

fn check_range(
    rule: &RangeRule,
    subject: &str,
    value: &ParamValue,
    mode: BoundMode<'_>,
) -> Vec<RuleFailure> {
    let mut failures = Vec::new();
    for (bound, side) in [(&rule.min, Side::Min), (&rule.max, Side::Max)] {
        let Some(bound) = bound else { continue };
        match bound {
            Bound::Literal(limit) => {
                if mode.literals() {
                    compare_against(
                        subject,
                        value,
                        &ParamValue::Scalar(limit.clone()),
                        side,
                        "",
                        &mut failures,
                    );
                }
            }
            Bound::Reference(param) => {
                let Some(resolver) = mode.resolver() else { continue };
                match resolver.resolve(param) {
                    Err(message) => failures.push(RuleFailure::new(
                        ViolationKind::ContextResolution,
                        format!("{subject}: cannot resolve bound `{param}`: {message}"),
                    )),
                    Ok(candidates) => {
                        for candidate in candidates {
                            let origin = format!(
                                " (value of `{param}` for {})",
                                describe_labels(&candidate.labels)
                            );
                            compare_against(
                                subject,
                                value,
                                &candidate.value,
                                side,
                                &origin,
                                &mut failures,
                            );
                        }
                    }
                }
            }
        }
    }
    failures
}

/// Compare `value` against `limit`. A scalar limit applies to every element;
/// an array limit of the same shape applies element-wise.
fn compare_against(
    subject: &str,
    value: &ParamValue,
    limit: &ParamValue,
    side: Side,
    origin: &str,
    failures: &mut Vec<RuleFailure>,
) {
    match (value, limit) {
        (_, ParamValue::Scalar(limit)) => {
            for leaf in value.leaves() {
                let violated = match (leaf.compare(limit), side) {
                    (Some(Ordering::Less), Side::Min) | (Some(Ordering::Greater), Side::Max) => {
                        true
                    }
                    (Some(_), _) => false,
                    (None, _) => {
                        failures.push(RuleFailure::new(
                            ViolationKind::OutOfRange,
                            format!("{subject} {leaf} cannot be compared with {limit}{origin}"),
                        ));
                        continue;
                    }
                };
                if violated {
                    let relation = match side {
                        Side::Min => "greater than or equal to",
                        Side::Max => "less than or equal to",
                    };
                    failures.push(RuleFailure::new(
                        ViolationKind::OutOfRange,
                        format!("{subject} {leaf} must be {relation} {limit}{origin}"),
                    ));
                }
            }
        }
        (ParamValue::Array(values), ParamValue::Array(limits)) if values.len() == limits.len() => {
            for (v, l) in values.iter().zip(limits) {
                compare_against(subject, v, l, side, origin, failures);
            }
        }
        _ => failures.push(RuleFailure::new(
            ViolationKind::ContextResolution,
            format!("{subject} {value} has a different shape than bound {limit}{origin}"),
        )),
    }
}

fn join_scalars(items: &[Scalar]) -> String {
    items
        .iter()
        .map(Scalar::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
