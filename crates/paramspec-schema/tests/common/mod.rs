#![allow(dead_code)]

use paramspec_schema::{compile, CompileOptions, CompiledSchemas};
use serde_json::{json, Value};

pub fn schema_def() -> Value {
    json!({
        "schema_name": "taxes",
        "dims": {
            "year": {"type": "int", "validators": {"range": {"min": 2013, "max": 2027}}},
            "MARS": {
                "type": "str",
                "validators": {"choice": {"choices": ["single", "joint", "separate"]}}
            }
        },
        "optional_params": {
            "section_1": {"type": "str"},
            "indexed": {"type": "bool"}
        }
    })
}

pub fn baseline() -> Value {
    json!({
        "A": [
            {"value": 5, "year": 2020},
            {"value": 6, "year": 2021}
        ],
        "B": {
            "title": "Bounded by A",
            "description": "Must not exceed A for the same year.",
            "section_1": "Limits",
            "validators": {"range": {"min": 0, "max": "A"}},
            "value": [
                {"value": 3, "year": 2020},
                {"value": 4, "year": 2021}
            ]
        },
        "rate": 0.25,
        "standard": [
            {"value": 100, "MARS": "single", "year": 2020},
            {"value": 200, "MARS": "joint", "year": 2020},
            {"value": 110, "MARS": "single", "year": 2021},
            {"value": 220, "MARS": "joint", "year": 2021}
        ],
        "cap": {
            "type": "int",
            "indexed": true,
            "validators": {"range": {"max": "standard"}},
            "value": [
                {"value": 50, "MARS": "single", "year": 2020},
                {"value": 60, "MARS": "joint", "year": 2020}
            ]
        }
    })
}

pub fn compiled() -> CompiledSchemas {
    compile(&schema_def(), &baseline(), &CompileOptions::default()).unwrap()
}

pub fn compiled_with(options: CompileOptions) -> CompiledSchemas {
    compile(&schema_def(), &baseline(), &options).unwrap()
}
