//! Per-parameter schema compiler.
//!
//! Every baseline parameter is compiled into an immutable
//! [`ParameterSchemaFragment`]: its value type and nesting depth, whether it
//! holds a single value or a sequence of labeled entries, its value rules,
//! and a shared handle to the dimension registry. Fragments are independent
//! of each other and live in a [`FragmentRegistry`] keyed by name.

use std::collections::BTreeMap;
use std::sync::Arc;

use paramspec_core::config::ValidationConfig;
use paramspec_core::errors::{
    CompilationCause, CompileError, DimensionDefinitionError, ParameterCompilationError,
    ViolationKind,
};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cleaned::{CleanedParam, ParamMeta};
use crate::definition::{OptionalParams, SchemaDefinition};
use crate::dimensions::DimensionRegistry;
use crate::resolver::{resolve_type, shape_of, Shape};
use crate::rules::{parse_rules, BoundMode, ReferencePolicy, Rule, RuleSet};
use crate::types::{
    describe_json, describe_labels, label_key, CoercionError, Entry, FieldType, LabelAssignment,
    ParamValue, TypeAliases,
};
use crate::violations::ViolationSink;

/// Options fixed at compile time and applied to every validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub infer_date_strings: bool,
    pub strict_metadata: bool,
    pub max_violations: Option<usize>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            infer_date_strings: true,
            strict_metadata: true,
            max_violations: None,
        }
    }
}

impl From<&ValidationConfig> for CompileOptions {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            infer_date_strings: config.effective_infer_date_strings(),
            strict_metadata: config.effective_strict_metadata(),
            max_violations: config.effective_max_violations(),
        }
    }
}

/// Compiled validation artifact for one parameter.
#[derive(Debug, Clone)]
pub struct ParameterSchemaFragment {
    name: String,
    value_type: FieldType,
    number_dims: usize,
    shape: Shape,
    declared: bool,
    rules: RuleSet,
    dims: Arc<DimensionRegistry>,
}

impl ParameterSchemaFragment {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> FieldType {
        self.value_type
    }

    pub fn number_dims(&self) -> usize {
        self.number_dims
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Whether the type came from an explicit `type` key.
    pub fn is_declared(&self) -> bool {
        self.declared
    }

    /// Value rules compiled from the baseline's `validators`.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        &self.dims
    }

    /// Coerce a raw value to this parameter's type and nesting depth.
    pub fn clean_value(&self, raw: &Value) -> Result<ParamValue, CoercionError> {
        ParamValue::coerce(raw, self.value_type, self.number_dims)
    }

    /// Clean one `{ value, <dim>: label, ... }` record. Labels are checked
    /// against literal dimension rules only. Returns `None` when the entry
    /// produced any violation.
    pub(crate) fn clean_entry(
        &self,
        raw: &Value,
        index: usize,
        sink: &mut ViolationSink,
    ) -> Option<Entry> {
        let at = Some(index);
        let Some(map) = raw.as_object() else {
            sink.push(
                &self.name,
                at,
                "<entry>",
                ViolationKind::InvalidStructure,
                format!("expected an entry object, got {}", describe_json(raw)),
            );
            return None;
        };
        let before = sink.len();

        let value = match map.get("value") {
            None => {
                sink.push(
                    &self.name,
                    at,
                    "value",
                    ViolationKind::MissingField,
                    "entry has no `value`",
                );
                None
            }
            Some(raw_value) => match self.clean_value(raw_value) {
                Ok(v) => Some(v),
                Err(e) => {
                    sink.push(&self.name, at, "value", ViolationKind::InvalidType, e.to_string());
                    None
                }
            },
        };

        let mut labels = LabelAssignment::new();
        for (dim, raw_label) in map.iter().filter(|(k, _)| k.as_str() != "value") {
            let Some(validator) = self.dims.get(dim) else {
                sink.push(
                    &self.name,
                    at,
                    dim,
                    ViolationKind::UnknownDimension,
                    format!("`{dim}` is not a declared dimension"),
                );
                continue;
            };
            match validator.coerce(raw_label) {
                Err(e) => sink.push(
                    &self.name,
                    at,
                    dim,
                    ViolationKind::InvalidLabel,
                    format!("{dim} label: {e}"),
                ),
                Ok(label) => {
                    let failures = validator.check(&label, BoundMode::Literals);
                    if failures.is_empty() {
                        labels.insert(dim.clone(), label);
                    }
                    for failure in failures {
                        sink.push_failure(&self.name, at, dim, failure, true);
                    }
                }
            }
        }

        if sink.len() > before {
            return None;
        }
        value.map(|v| Entry::new(v, labels))
    }

    /// Report every entry whose label assignment repeats an earlier one.
    pub(crate) fn check_duplicates(&self, entries: &[(usize, Entry)], sink: &mut ViolationSink) {
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for (index, entry) in entries {
            let key = label_key(&entry.labels);
            if let Some(first) = seen.get(&key) {
                sink.push(
                    &self.name,
                    Some(*index),
                    "<labels>",
                    ViolationKind::DuplicateLabels,
                    format!(
                        "label assignment {} repeats entry {first}",
                        describe_labels(&entry.labels)
                    ),
                );
            } else {
                seen.insert(key, *index);
            }
        }
    }

    /// Validate one raw baseline parameter. Returns `None` when it produced
    /// any violation.
    pub(crate) fn clean_baseline(
        &self,
        raw: &Value,
        fragments: &FragmentRegistry,
        options: &CompileOptions,
        sink: &mut ViolationSink,
    ) -> Option<CleanedParam> {
        let before = sink.len();
        let mut meta = ParamMeta::default();
        let mut rules = RuleSet::new();

        let value = match raw {
            Value::Object(map) => {
                meta.is_object = true;
                rules = self.clean_metadata(map, fragments, options, &mut meta, sink);
                match map.get("value") {
                    Some(value) => value,
                    None => {
                        sink.push(
                            &self.name,
                            None,
                            "value",
                            ViolationKind::MissingField,
                            "parameter object has no `value`",
                        );
                        return None;
                    }
                }
            }
            other => other,
        };

        let entries = self.clean_baseline_value(value, sink);
        if sink.len() > before {
            return None;
        }
        Some(CleanedParam {
            value_type: self.value_type,
            number_dims: self.number_dims,
            shape: self.shape,
            meta,
            rules,
            entries,
        })
    }

    fn clean_metadata(
        &self,
        map: &Map<String, Value>,
        fragments: &FragmentRegistry,
        options: &CompileOptions,
        meta: &mut ParamMeta,
        sink: &mut ViolationSink,
    ) -> RuleSet {
        let mut rules = RuleSet::new();
        for (key, raw) in map {
            let mut invalid = |kind: ViolationKind, message: String| {
                sink.push(&self.name, None, key, kind, message)
            };
            match key.as_str() {
                "value" => {}
                "title" | "description" | "notes" => match raw {
                    Value::Null => {}
                    Value::String(s) => {
                        let slot = match key.as_str() {
                            "title" => &mut meta.title,
                            "description" => &mut meta.description,
                            _ => &mut meta.notes,
                        };
                        *slot = Some(s.clone());
                    }
                    other => invalid(
                        ViolationKind::InvalidType,
                        format!("`{key}` must be a string, got {}", describe_json(other)),
                    ),
                },
                "type" => match raw.as_str().and_then(|name| fragments.aliases().resolve(name)) {
                    Some(declared) if declared == self.value_type => {}
                    Some(declared) => invalid(
                        ViolationKind::InvalidType,
                        format!(
                            "declared type {declared} does not match compiled type {}",
                            self.value_type
                        ),
                    ),
                    None => invalid(
                        ViolationKind::InvalidType,
                        format!("unknown type {}", describe_json(raw)),
                    ),
                },
                "number_dims" => {
                    if raw.as_u64() != Some(self.number_dims as u64) {
                        invalid(
                            ViolationKind::InvalidType,
                            format!(
                                "`number_dims` must be {}, got {}",
                                self.number_dims,
                                describe_json(raw)
                            ),
                        );
                    }
                }
                "validators" => match compile_rules(raw, self.value_type, fragments) {
                    Ok(parsed) => rules = parsed,
                    Err(cause) => invalid(ViolationKind::InvalidStructure, cause.to_string()),
                },
                other => match fragments.optional_params().get(other) {
                    Some(&(field_type, number_dims)) => {
                        match ParamValue::coerce(raw, field_type, number_dims) {
                            Ok(v) => {
                                meta.extra.insert(other.to_string(), v);
                            }
                            Err(e) => {
                                invalid(ViolationKind::InvalidType, format!("`{other}`: {e}"))
                            }
                        }
                    }
                    None if options.strict_metadata => invalid(
                        ViolationKind::UnknownField,
                        format!("`{other}` is not a declared metadata field"),
                    ),
                    None => {}
                },
            }
        }
        rules
    }

    fn clean_baseline_value(&self, value: &Value, sink: &mut ViolationSink) -> Vec<Entry> {
        let shape = match shape_of(value, self.number_dims) {
            Ok(shape) => shape,
            Err(e) => {
                let kind = ViolationKind::InvalidStructure;
                sink.push(&self.name, None, "value", kind, e.to_string());
                return Vec::new();
            }
        };
        if shape != self.shape {
            let message = match self.shape {
                Shape::Single => "expected a single value, got a list of entries",
                Shape::Sequence => "expected a list of entries, got a single value",
            };
            sink.push(&self.name, None, "value", ViolationKind::InvalidStructure, message);
            return Vec::new();
        }

        match shape {
            Shape::Single => match self.clean_value(value) {
                Ok(v) => vec![Entry::unlabeled(v)],
                Err(e) => {
                    sink.push(&self.name, None, "value", ViolationKind::InvalidType, e.to_string());
                    Vec::new()
                }
            },
            Shape::Sequence => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                let cleaned = self.clean_entries(items, sink);
                self.check_duplicates(&cleaned, sink);
                cleaned.into_iter().map(|(_, entry)| entry).collect()
            }
        }
    }

    /// Clean a revision's entry list. Returns the entries that cleaned,
    /// paired with their input index.
    pub(crate) fn clean_revision(
        &self,
        raw: &Value,
        sink: &mut ViolationSink,
    ) -> Vec<(usize, Entry)> {
        let Some(items) = raw.as_array() else {
            sink.push(
                &self.name,
                None,
                "<param>",
                ViolationKind::InvalidStructure,
                format!("expected a list of entries, got {}", describe_json(raw)),
            );
            return Vec::new();
        };
        let cleaned = self.clean_entries(items, sink);
        self.check_duplicates(&cleaned, sink);
        cleaned
    }

    fn clean_entries(&self, items: &[Value], sink: &mut ViolationSink) -> Vec<(usize, Entry)> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.clean_entry(item, index, sink).map(|e| (index, e)))
            .collect()
    }
}

/// Parameter name -> compiled fragment, plus the type tables every fragment
/// was compiled against.
#[derive(Debug, Clone, Default)]
pub struct FragmentRegistry {
    fragments: BTreeMap<String, ParameterSchemaFragment>,
    aliases: TypeAliases,
    optional: OptionalParams,
}

impl FragmentRegistry {
    pub fn get(&self, param: &str) -> Option<&ParameterSchemaFragment> {
        self.fragments.get(param)
    }

    pub fn contains(&self, param: &str) -> bool {
        self.fragments.contains_key(param)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSchemaFragment> {
        self.fragments.values()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn aliases(&self) -> &TypeAliases {
        &self.aliases
    }

    pub fn optional_params(&self) -> &OptionalParams {
        &self.optional
    }
}

/// Compile one fragment per baseline parameter.
///
/// Types are resolved for every parameter before any `validators` block is
/// parsed, so a bound may reference a parameter declared later in the
/// document. Dimension bounds that reference parameters are checked last.
pub fn compile_fragments(
    definition: &SchemaDefinition,
    dimensions: Arc<DimensionRegistry>,
    baseline: &Value,
    options: &CompileOptions,
) -> Result<FragmentRegistry, CompileError> {
    let aliases = definition.type_aliases()?;
    let optional = definition.optional_params(&aliases)?;
    let params = baseline.as_object().ok_or_else(|| {
        CompileError::InvalidBaseline(format!(
            "expected an object of parameters, got {}",
            describe_json(baseline)
        ))
    })?;

    let mut registry = FragmentRegistry {
        fragments: BTreeMap::new(),
        aliases,
        optional,
    };

    for (name, raw) in params {
        let resolved = resolve_type(raw, &registry.aliases, options.infer_date_strings)
            .map_err(|e| ParameterCompilationError::new(name.as_str(), e))?;
        debug!(
            param = %name,
            field_type = %resolved.field_type,
            number_dims = resolved.number_dims,
            shape = ?resolved.shape,
            declared = resolved.declared,
            "resolved parameter type"
        );
        registry.fragments.insert(
            name.clone(),
            ParameterSchemaFragment {
                name: name.clone(),
                value_type: resolved.field_type,
                number_dims: resolved.number_dims,
                shape: resolved.shape,
                declared: resolved.declared,
                rules: RuleSet::new(),
                dims: Arc::clone(&dimensions),
            },
        );
    }

    let mut compiled = Vec::new();
    for (name, raw) in params {
        let (Some(validators), Some(fragment)) = (raw.get("validators"), registry.get(name)) else {
            continue;
        };
        let rules = compile_rules(validators, fragment.value_type(), &registry)
            .map_err(|cause| ParameterCompilationError::new(name.as_str(), cause))?;
        compiled.push((name, rules));
    }
    for (name, rules) in compiled {
        if let Some(fragment) = registry.fragments.get_mut(name) {
            fragment.rules = rules;
        }
    }

    for validator in dimensions.iter() {
        for param in validator.references() {
            let target =
                registry
                    .get(param)
                    .ok_or_else(|| DimensionDefinitionError::UnknownReference {
                        dimension: validator.name().to_string(),
                        param: param.to_string(),
                    })?;
            if !target.value_type().comparable_with(validator.label_type()) {
                return Err(DimensionDefinitionError::InvalidParameters {
                    dimension: validator.name().to_string(),
                    message: format!(
                        "bound `{param}` has type {}, not comparable with {}",
                        target.value_type(),
                        validator.label_type()
                    ),
                }
                .into());
            }
        }
    }

    Ok(registry)
}

/// Parse a parameter's `validators`. String bounds naming a compiled
/// parameter become references, which must point at a comparable type.
fn compile_rules(
    validators: &Value,
    value_type: FieldType,
    fragments: &FragmentRegistry,
) -> Result<RuleSet, CompilationCause> {
    let known = |name: &str| fragments.contains(name);
    let rules = parse_rules(validators, value_type, ReferencePolicy::KnownParams(&known))
        .map_err(|e| CompilationCause::InvalidValidator(e.to_string()))?;

    for reference in rules.iter().flat_map(|rule| rule.references()) {
        let target = fragments
            .get(reference)
            .ok_or_else(|| CompilationCause::UnknownReference(reference.to_string()))?;
        if !target.value_type().comparable_with(value_type) {
            return Err(CompilationCause::IncomparableReference {
                reference: reference.to_string(),
                reference_type: target.value_type().name().to_string(),
                value_type: value_type.name().to_string(),
            });
        }
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(def: Value, baseline: Value) -> Result<FragmentRegistry, CompileError> {
        let def = SchemaDefinition::from_value(&def)?;
        let aliases = def.type_aliases()?;
        let dims = Arc::new(DimensionRegistry::from_definition(&def, &aliases)?);
        compile_fragments(&def, dims, &baseline, &CompileOptions::default())
    }

    fn year_def() -> Value {
        json!({
            "dims": {"year": {"type": "int", "validators": {"range": {"min": 2013, "max": 2027}}}}
        })
    }

    #[test]
    fn one_fragment_per_parameter() {
        let fragments = compile(
            year_def(),
            json!({
                "rate": 0.5,
                "cap": [{"value": 10, "year": 2020}],
                "label": {"type": "str", "value": "x"}
            }),
        )
        .unwrap();
        assert_eq!(fragments.names().collect::<Vec<_>>(), vec!["cap", "label", "rate"]);
        let cap = fragments.get("cap").unwrap();
        assert_eq!(cap.value_type(), FieldType::Int);
        assert_eq!(cap.shape(), Shape::Sequence);
        assert!(fragments.get("label").unwrap().is_declared());
        assert_eq!(cap.dimensions().names(), &["year".to_string()]);
    }

    #[test]
    fn resolution_failure_names_the_parameter() {
        let err = compile(year_def(), json!({"bad": []})).unwrap_err();
        match err {
            CompileError::Parameter(e) => assert_eq!(e.param, "bad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn references_may_point_forward() {
        let fragments = compile(
            year_def(),
            json!({
                "B": {"value": [{"value": 3, "year": 2020}], "validators": {"range": {"max": "A"}}},
                "A": [{"value": 5, "year": 2020}]
            }),
        )
        .unwrap();
        assert!(fragments.get("B").unwrap().rules()[0].has_references());
    }

    #[test]
    fn incomparable_reference_is_rejected() {
        let err = compile(
            year_def(),
            json!({
                "name": "abc",
                "B": {"value": 3, "validators": {"range": {"max": "name"}}}
            }),
        );
        // `name` is a str, so the bound parses as a reference and fails comparability.
        match err {
            Err(CompileError::Parameter(e)) => {
                assert!(matches!(e.cause, CompilationCause::IncomparableReference { .. }))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn dimension_reference_must_exist() {
        let def = json!({
            "dims": {"year": {"type": "int", "validators": {"range": {"max": "end_year"}}}}
        });
        let err = compile(def.clone(), json!({"rate": 1})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Dimension(DimensionDefinitionError::UnknownReference { .. })
        ));
        assert!(compile(def, json!({"rate": 1, "end_year": 2030})).is_ok());
    }

    #[test]
    fn non_object_baseline_is_rejected() {
        assert!(matches!(
            compile(year_def(), json!([1, 2])),
            Err(CompileError::InvalidBaseline(_))
        ));
    }

    #[test]
    fn clean_entry_reports_every_problem() {
        let fragments = compile(year_def(), json!({"cap": [{"value": 1, "year": 2020}]})).unwrap();
        let cap = fragments.get("cap").unwrap();
        let mut sink = ViolationSink::new();
        let raw = json!({"value": "abc", "year": 2050, "region": "x"});
        let entry = cap.clean_entry(&raw, 0, &mut sink);
        assert!(entry.is_none());
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn options_follow_config_defaults() {
        let options = CompileOptions::from(&ValidationConfig::default());
        assert_eq!(options, CompileOptions::default());
    }
}
