//! Property-based tests for coercion, baseline cleaning, and context lookups.

use paramspec_core::errors::ViolationKind;
use paramspec_schema::{compile, CompileOptions, FieldType, ParamValue, Scalar};
use proptest::prelude::*;
use serde_json::{json, Value};

fn year_def() -> Value {
    json!({
        "dims": {
            "year": {"type": "int", "validators": {"range": {"min": 2013, "max": 2027}}},
            "MARS": {"type": "str", "validators": {"choice": {"choices": ["single", "joint"]}}}
        }
    })
}

fn entries(values: &[(i64, i64)]) -> Value {
    Value::Array(
        values
            .iter()
            .map(|(year, value)| json!({"value": value, "year": year}))
            .collect(),
    )
}

proptest! {
    #[test]
    fn int_coercion_accepts_numbers_and_decimal_strings(i in any::<i64>()) {
        prop_assert_eq!(FieldType::Int.coerce(&json!(i)).unwrap(), Scalar::Int(i));
        prop_assert_eq!(FieldType::Int.coerce(&json!(i.to_string())).unwrap(), Scalar::Int(i));
    }

    #[test]
    fn cleaning_is_idempotent_and_preserves_types(
        values in prop::collection::btree_map(2013i64..=2027, -1_000_000i64..1_000_000, 1..10)
    ) {
        let pairs: Vec<(i64, i64)> = values.into_iter().collect();
        let base = json!({"amount": {"type": "float", "value": entries(&pairs)}});
        let compiled = compile(&year_def(), &base, &CompileOptions::default()).unwrap();

        let first = compiled.validate_baseline(&base).unwrap();
        let second = compiled.validate_baseline(&base).unwrap();
        prop_assert_eq!(&first, &second);

        let cleaned = first.entries("amount");
        prop_assert_eq!(cleaned.len(), pairs.len());
        for (entry, (year, value)) in cleaned.iter().zip(&pairs) {
            prop_assert_eq!(&entry.value, &ParamValue::Scalar(Scalar::Float(*value as f64)));
            prop_assert_eq!(entry.labels.get("year"), Some(&Scalar::Int(*year)));
        }
    }

    #[test]
    fn out_of_range_labels_are_always_named(year in prop_oneof![1900i64..2013, 2028i64..3000]) {
        let good = json!({"amount": [{"value": 1, "year": 2020}]});
        let compiled = compile(&year_def(), &good, &CompileOptions::default()).unwrap();

        let bad = json!({"amount": [{"value": 1, "year": 2020}, {"value": 2, "year": year}]});
        let err = compiled.validate_baseline(&bad).unwrap_err();
        prop_assert_eq!(err.len(), 1);
        let v = &err.violations[0];
        prop_assert_eq!(v.param.as_str(), "amount");
        prop_assert_eq!(v.entry_index, Some(1));
        prop_assert_eq!(v.field.as_str(), "year");
        prop_assert_eq!(v.kind, ViolationKind::InvalidLabel);
    }

    #[test]
    fn reference_bound_matches_comparison(a in -1000i64..1000, b in -1000i64..1000) {
        let base = json!({
            "A": [{"value": a, "year": 2020}],
            "B": {
                "type": "int",
                "value": [{"value": a, "year": 2020}],
                "validators": {"range": {"max": "A"}}
            }
        });
        let compiled = compile(&year_def(), &base, &CompileOptions::default()).unwrap();
        let cleaned = compiled.validate_baseline(&base).unwrap();

        let revision = json!({"B": [{"value": b, "year": 2020}]});
        let result = compiled.validate_revision(&revision, &cleaned);
        prop_assert_eq!(result.is_ok(), b <= a);
    }

    #[test]
    fn partial_labels_check_every_matching_entry(
        single in 0i64..500,
        joint in 0i64..500,
        cap in 0i64..500,
    ) {
        let base = json!({
            "standard": [
                {"value": single, "MARS": "single", "year": 2020},
                {"value": joint, "MARS": "joint", "year": 2020}
            ],
            "cap": {
                "type": "int",
                "value": [{"value": 0, "year": 2020}],
                "validators": {"range": {"max": "standard"}}
            }
        });
        let compiled = compile(&year_def(), &base, &CompileOptions::default()).unwrap();
        let cleaned = compiled.validate_baseline(&base).unwrap();

        let expected = [single, joint].iter().filter(|limit| cap > **limit).count();
        let revision = json!({"cap": [{"value": cap, "year": 2020}]});
        let result = compiled.validate_revision(&revision, &cleaned);
        match result {
            Ok(_) => prop_assert_eq!(expected, 0),
            Err(err) => {
                prop_assert_eq!(err.len(), expected);
                prop_assert!(err.violations.iter().all(|v| v.kind == ViolationKind::OutOfRange));
            }
        }
    }

    #[test]
    fn every_bad_entry_is_reported(bad in 1usize..20) {
        let base = json!({"amount": [{"value": 1, "year": 2020}]});
        let compiled = compile(&year_def(), &base, &CompileOptions::default()).unwrap();
        let cleaned = compiled.validate_baseline(&base).unwrap();

        let revision: Vec<Value> = (0..bad).map(|i| json!({"value": format!("bad-{i}")})).collect();
        let err = compiled
            .validate_revision(&json!({"amount": revision}), &cleaned)
            .unwrap_err();
        prop_assert_eq!(err.len(), bad);
        prop_assert!(err.violations.iter().all(|v| v.kind == ViolationKind::InvalidType));
    }
}
