//! Revision validation tests: context lookups, partial labels, batching.

mod common;

use paramspec_core::errors::{ParamSpecErrorCode, ValidationStage, ViolationKind};
use paramspec_schema::{compile, CompileOptions, ParamValue, Scalar};
use serde_json::json;

use common::{baseline, compiled, compiled_with};

#[test]
fn test_cross_reference_same_year() {
    let def = json!({
        "dims": {"year": {"type": "int", "validators": {"range": {"min": 2013, "max": 2027}}}}
    });
    let base = json!({
        "A": [{"value": 5, "year": 2020}],
        "B": {"value": [{"value": 3, "year": 2020}], "validators": {"range": {"max": "A"}}}
    });
    let compiled = compile(&def, &base, &CompileOptions::default()).unwrap();
    let cleaned = compiled.validate_baseline(&base).unwrap();

    let err = compiled
        .validate_revision(&json!({"B": [{"value": 10, "year": 2020}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.stage, ValidationStage::Revision);
    assert_eq!(err.len(), 1);
    let v = &err.violations[0];
    assert_eq!(v.param, "B");
    assert_eq!(v.entry_index, Some(0));
    assert_eq!(v.kind, ViolationKind::OutOfRange);
    assert!(v.message.contains("`A`"));
    assert!(v.message.contains("year=2020"));

    let ok = compiled
        .validate_revision(&json!({"B": [{"value": 4, "year": 2020}]}), &cleaned)
        .unwrap();
    assert_eq!(ok.to_json(), json!({"B": [{"value": 4, "year": 2020}]}));
}

#[test]
fn test_unknown_parameter_in_revision() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let err = compiled
        .validate_revision(&json!({"nope": [{"value": 1}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.violations[0].param, "nope");
    assert_eq!(err.violations[0].kind, ViolationKind::UnknownParameter);
    assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
}

#[test]
fn test_parameter_missing_from_supplied_baseline_is_unknown() {
    let compiled = compiled();
    let partial = compiled.validate_baseline(&json!({"rate": 0.1})).unwrap();
    let err = compiled
        .validate_revision(&json!({"A": [{"value": 1, "year": 2020}]}), &partial)
        .unwrap_err();
    assert_eq!(err.violations[0].kind, ViolationKind::UnknownParameter);
}

#[test]
fn test_partial_labels_checked_against_every_match() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();

    // standard for 2020: single=100, joint=200. 150 only breaks the first.
    let err = compiled
        .validate_revision(&json!({"cap": [{"value": 150, "year": 2020}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.len(), 1);
    assert!(err.violations[0].message.contains("MARS=single"));

    // 250 breaks both.
    let err = compiled
        .validate_revision(&json!({"cap": [{"value": 250, "year": 2020}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.len(), 2);

    // Omitting every dimension checks all four entries.
    let err = compiled
        .validate_revision(&json!({"cap": [{"value": 205}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.len(), 3);

    assert!(compiled
        .validate_revision(&json!({"cap": [{"value": 90, "year": 2020}]}), &cleaned)
        .is_ok());
}

#[test]
fn test_fully_labeled_entry_uses_single_match() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let revision = json!({"cap": [{"value": 150, "MARS": "joint", "year": 2020}]});
    let out = compiled.validate_revision(&revision, &cleaned).unwrap();
    let entries = out.get("cap").unwrap();
    assert_eq!(entries[0].value, ParamValue::Scalar(Scalar::Int(150)));
    assert_eq!(entries[0].labels.get("MARS"), Some(&Scalar::Str("joint".into())));
}

#[test]
fn test_revision_values_take_precedence_over_baseline() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();

    let without = json!({"cap": [{"value": 150, "MARS": "single", "year": 2020}]});
    assert!(compiled.validate_revision(&without, &cleaned).is_err());

    let with = json!({
        "standard": [{"value": 300, "MARS": "single", "year": 2020}],
        "cap": [{"value": 150, "MARS": "single", "year": 2020}]
    });
    assert!(compiled.validate_revision(&with, &cleaned).is_ok());
}

#[test]
fn test_revised_bound_keeps_unrevised_baseline_labels() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();

    // Only single/2020 is raised to 300; joint/2020 stays at 200.
    let revision = json!({
        "standard": [{"value": 300, "MARS": "single", "year": 2020}],
        "cap": [{"value": 250, "year": 2020}]
    });
    let err = compiled.validate_revision(&revision, &cleaned).unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.violations[0].param, "cap");
    assert!(err.violations[0].message.contains("MARS=joint"));

    // A revised label assignment the baseline lacks is checked as well.
    let added = json!({
        "standard": [{"value": 10, "MARS": "separate", "year": 2020}],
        "cap": [{"value": 150, "year": 2020}]
    });
    let err = compiled.validate_revision(&added, &cleaned).unwrap_err();
    assert_eq!(err.len(), 2);
    assert!(err.violations.iter().any(|v| v.message.contains("MARS=separate")));
}

#[test]
fn test_missing_reference_target_is_context_error() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let err = compiled
        .validate_revision(&json!({"cap": [{"value": 10, "year": 2025}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.len(), 1);
    assert_eq!(err.violations[0].kind, ViolationKind::ContextResolution);
    assert!(err.violations[0].message.contains("year=2025"));
    assert_eq!(err.error_code(), "CONTEXT_RESOLUTION_ERROR");
}

#[test]
fn test_batch_reports_every_violation() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let revision = json!({
        "B": [
            {"value": 10, "year": 2020},
            {"value": "x", "year": 2021}
        ],
        "rate": [{"value": 0.1, "year": 2050}]
    });
    let err = compiled.validate_revision(&revision, &cleaned).unwrap_err();
    assert_eq!(err.len(), 3);
    assert_eq!(err.params(), vec!["B", "rate"]);

    let found: Vec<_> = err
        .violations
        .iter()
        .map(|v| (v.param.as_str(), v.entry_index, v.kind))
        .collect();
    assert_eq!(
        found,
        vec![
            ("B", Some(0), ViolationKind::OutOfRange),
            ("B", Some(1), ViolationKind::InvalidType),
            ("rate", Some(0), ViolationKind::InvalidLabel),
        ]
    );
}

#[test]
fn test_literal_value_bounds_apply_in_revision() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let err = compiled
        .validate_revision(&json!({"B": [{"value": -1, "year": 2021}]}), &cleaned)
        .unwrap_err();
    assert!(err.violations[0].message.contains("greater than or equal to 0"));
}

#[test]
fn test_duplicate_labels_within_revision() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let revision = json!({"A": [{"value": 1, "year": 2020}, {"value": 2, "year": 2020}]});
    let err = compiled.validate_revision(&revision, &cleaned).unwrap_err();
    assert_eq!(err.violations[0].kind, ViolationKind::DuplicateLabels);
    assert_eq!(err.violations[0].entry_index, Some(1));
}

#[test]
fn test_revision_param_must_be_a_list() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let err = compiled
        .validate_revision(&json!({"rate": 0.3}), &cleaned)
        .unwrap_err();
    assert_eq!(err.violations[0].field, "<param>");
    assert_eq!(err.violations[0].kind, ViolationKind::InvalidStructure);
}

#[test]
fn test_dimension_bound_referencing_parameter() {
    let def = json!({
        "dims": {"year": {"type": "int", "validators": {"range": {"min": 2013, "max": "end_year"}}}}
    });
    let base = json!({"end_year": 2025, "rate": [{"value": 1.0, "year": 2020}]});
    let compiled = compile(&def, &base, &CompileOptions::default()).unwrap();
    let cleaned = compiled.validate_baseline(&base).unwrap();

    let err = compiled
        .validate_revision(&json!({"rate": [{"value": 2.0, "year": 2026}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.violations[0].field, "year");
    assert_eq!(err.violations[0].kind, ViolationKind::InvalidLabel);
    assert!(err.violations[0].message.contains("`end_year`"));

    assert!(compiled
        .validate_revision(&json!({"rate": [{"value": 2.0, "year": 2024}]}), &cleaned)
        .is_ok());

    let extended = json!({
        "end_year": [{"value": 2030}],
        "rate": [{"value": 2.0, "year": 2026}]
    });
    assert!(compiled.validate_revision(&extended, &cleaned).is_ok());

    let err = compiled
        .validate_revision(&json!({"rate": [{"value": 2.0, "year": 2010}]}), &cleaned)
        .unwrap_err();
    assert_eq!(err.violations[0].kind, ViolationKind::InvalidLabel);
}

#[test]
fn test_date_bounds() {
    let base = json!({
        "start": {"type": "date", "value": "2020-01-01"},
        "end": {
            "type": "date",
            "validators": {"date_range": {"min": "start", "max": "2030-12-31"}},
            "value": "2021-06-30"
        }
    });
    let compiled = compile(&json!({}), &base, &CompileOptions::default()).unwrap();
    let cleaned = compiled.validate_baseline(&base).unwrap();
    assert_eq!(cleaned.to_json()["end"]["value"], json!("2021-06-30"));

    let early = json!({"end": [{"value": "2019-06-01"}]});
    let err = compiled.validate_revision(&early, &cleaned).unwrap_err();
    assert_eq!(err.violations[0].kind, ViolationKind::OutOfRange);

    let late = json!({"end": [{"value": "2031-01-01"}]});
    assert!(compiled.validate_revision(&late, &cleaned).is_err());

    let fine = json!({"end": [{"value": "2025-01-01"}]});
    assert!(compiled.validate_revision(&fine, &cleaned).is_ok());
}

#[test]
fn test_array_values_checked_element_wise() {
    let base = json!({
        "ceiling": {"type": "int", "number_dims": 1, "value": [10, 20, 30]},
        "brackets": {
            "type": "int",
            "number_dims": 1,
            "validators": {"range": {"min": 0, "max": "ceiling"}},
            "value": [1, 2, 3]
        }
    });
    let compiled = compile(&json!({}), &base, &CompileOptions::default()).unwrap();
    let cleaned = compiled.validate_baseline(&base).unwrap();

    let ok = json!({"brackets": [{"value": [10, 15, 30]}]});
    assert!(compiled.validate_revision(&ok, &cleaned).is_ok());

    let bad = json!({"brackets": [{"value": [11, -1, 30]}]});
    let err = compiled.validate_revision(&bad, &cleaned).unwrap_err();
    assert_eq!(err.len(), 2);

    let wrong_shape = json!({"brackets": [{"value": [1, 2]}]});
    let err = compiled.validate_revision(&wrong_shape, &cleaned).unwrap_err();
    assert!(err.has_kind(ViolationKind::ContextResolution));
}

#[test]
fn test_revision_truncation() {
    let compiled = compiled_with(CompileOptions {
        max_violations: Some(1),
        ..CompileOptions::default()
    });
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let revision = json!({"A": [{"value": "a"}, {"value": "b"}, {"value": "c"}]});
    let err = compiled.validate_revision(&revision, &cleaned).unwrap_err();
    assert_eq!(err.len(), 1);
    assert!(err.truncated);
    assert_eq!(err.violations[0].entry_index, Some(0));
}

#[test]
fn test_empty_revision_is_valid() {
    let compiled = compiled();
    let cleaned = compiled.validate_baseline(&baseline()).unwrap();
    let out = compiled.validate_revision(&json!({}), &cleaned).unwrap();
    assert!(out.is_empty());
}
