use std::sync::Arc;

use regex::Regex;
use serde_json::json;

use schema_check_core::{
    CheckOptions, Level, Object, RecordingDiagnostics, Schema, SchemaChecker, SchemaError, Value,
    WriteError, WriteOutcome, check,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn hero() -> Value {
    Value::from(json!({
        "name": "test",
        "life": 5,
        "bags": ["cheese", "sandwich"],
        "skills": {"sword": 5, "magic": 5}
    }))
}

fn governed(target: &mut Value, schema: serde_json::Value) -> &mut Object {
    check(target, &Value::from(schema), None)
        .unwrap()
        .as_object_mut()
        .unwrap()
}

fn governed_silent(target: &mut Value, schema: serde_json::Value) -> &mut Object {
    check(target, &Value::from(schema), Some(CheckOptions::silent()))
        .unwrap()
        .as_object_mut()
        .unwrap()
}

/// Writes `value` (if any), asserts whether the write errored, then asserts
/// the field reads `expected` (if any).
fn validate_one(
    object: &mut Object,
    field: &str,
    value: Option<Value>,
    expected: Option<Value>,
    errors: bool,
) {
    let result = match value {
        Some(value) => object.set(field, value).map(|_| ()),
        None => Ok(()),
    };
    assert_eq!(result.is_err(), errors, "unexpected write result: {result:?}");
    if let Some(expected) = expected {
        assert_eq!(object.get(field), Some(&expected));
    }
}

// ---------------------------------------------------------------------------
// String fields
// ---------------------------------------------------------------------------

#[test]
fn test_string_returns_original_value_when_not_updated() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "string"}}));
    validate_one(object, "name", None, Some("test".into()), false);
}

#[test]
fn test_string_accepts_string() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "string"}}));
    validate_one(object, "name", Some("bob".into()), Some("bob".into()), false);
}

#[test]
fn test_string_rejects_mismatched_type() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "string"}}));
    validate_one(object, "name", Some(5.into()), Some("test".into()), true);
}

#[test]
fn test_string_ignores_write_to_non_editable_field() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "string", "editable": false}}));

    assert_eq!(object.set("name", "bob").unwrap(), WriteOutcome::Ignored);
    validate_one(object, "name", None, Some("test".into()), false);
}

#[test]
fn test_string_schema_leaves_other_fields_plain() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "string"}}));
    validate_one(object, "life", Some(32.into()), Some(32.into()), false);
    validate_one(object, "life", Some("many".into()), Some("many".into()), false);
}

// ---------------------------------------------------------------------------
// Number fields
// ---------------------------------------------------------------------------

#[test]
fn test_number_returns_original_value_when_not_updated() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number"}}));
    validate_one(object, "life", None, Some(5.into()), false);
}

#[test]
fn test_number_accepts_number() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number"}}));
    validate_one(object, "life", Some(10.into()), Some(10.into()), false);
}

#[test]
fn test_number_rejects_numeric_string() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number"}}));
    validate_one(object, "life", Some("100".into()), Some(5.into()), true);
}

#[test]
fn test_number_ignores_write_to_non_editable_field() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number", "editable": false}}));
    validate_one(object, "life", Some(20.into()), Some(5.into()), false);
}

#[test]
fn test_number_schema_leaves_other_fields_plain() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number"}}));
    validate_one(object, "name", Some("bob".into()), Some("bob".into()), false);
}

#[test]
fn test_number_range_is_inclusive() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number", "min": 5, "max": 10}}));

    validate_one(object, "life", Some(4.into()), Some(5.into()), true);
    validate_one(object, "life", Some(10.into()), Some(10.into()), false);
    validate_one(object, "life", Some(11.into()), Some(10.into()), true);
    validate_one(object, "life", Some(5.into()), Some(5.into()), false);
}

#[test]
fn test_number_range_violation_reports_bound() {
    let mut target = hero();
    let object = governed(&mut target, json!({"life": {"type": "number", "max": 10}}));

    let err = object.set("life", 11).unwrap_err();
    assert_eq!(
        err,
        WriteError::AboveMaximum {
            field: "life".to_string(),
            value: 11.0,
            max: 10.0,
        }
    );
}

// ---------------------------------------------------------------------------
// Boolean, array and object fields
// ---------------------------------------------------------------------------

#[test]
fn test_boolean_field() {
    let mut target = Value::from(json!({"alive": true}));
    let object = governed(&mut target, json!({"alive": {"type": "boolean"}}));

    validate_one(object, "alive", Some(false.into()), Some(false.into()), false);
    validate_one(object, "alive", Some("true".into()), Some(false.into()), true);
}

#[test]
fn test_array_field_is_shallow() {
    let mut target = hero();
    let object = governed(&mut target, json!({"bags": {"type": "array"}}));

    validate_one(
        object,
        "bags",
        Some(Value::from(json!([1, "mixed", null]))),
        Some(Value::from(json!([1, "mixed", null]))),
        false,
    );
    validate_one(
        object,
        "bags",
        Some("cheese".into()),
        Some(Value::from(json!([1, "mixed", null]))),
        true,
    );
}

#[test]
fn test_object_field_rejects_arrays_and_patterns() {
    let mut target = hero();
    let object = governed(&mut target, json!({"skills": {"type": "object"}}));

    assert!(object.set("skills", Value::from(json!(["sword"]))).is_err());
    assert!(object.set("skills", Regex::new("sword").unwrap()).is_err());
    assert!(object.set("skills", Value::from(json!({"bow": 1}))).is_ok());
    assert_eq!(object.get("skills"), Some(&Value::from(json!({"bow": 1}))));
}

#[test]
fn test_composite_field_skips_initial_type_check() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "array"}}));

    assert_eq!(object.get("name"), Some(&Value::from("test")));
    assert!(object.set("name", "other").is_err());
}

// ---------------------------------------------------------------------------
// Nulls
// ---------------------------------------------------------------------------

#[test]
fn test_null_accepted_when_allowed() {
    let mut target = hero();
    let object = governed(
        &mut target,
        json!({
            "name": {"type": "string", "allow_nulls": true},
            "bags": {"type": "array", "allow_nulls": true}
        }),
    );

    validate_one(object, "name", Some(Value::Null), Some(Value::Null), false);
    validate_one(object, "bags", Some(Value::Null), Some(Value::Null), false);
    validate_one(object, "name", Some("back".into()), Some("back".into()), false);
}

#[test]
fn test_null_rejected_by_default() {
    let mut target = hero();
    let object = governed(&mut target, json!({"name": {"type": "string"}}));
    validate_one(object, "name", Some(Value::Null), Some("test".into()), true);
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

#[test]
fn test_pattern_enforced_on_writes() {
    let mut target = hero();
    let schema = Schema::from_json(
        json!({"name": {"type": "string", "regex": {"$regex": "^(jim|jan)$"}}}),
        &schema_check_core::NoopDiagnostics,
    )
    .unwrap();
    let object = target.as_object_mut().unwrap();
    SchemaChecker::new().apply(object, &schema).unwrap();

    validate_one(object, "name", Some("jan".into()), Some("jan".into()), false);
    validate_one(object, "name", Some("joe".into()), Some("jan".into()), true);
}

#[test]
fn test_pattern_value_in_raw_schema() {
    let mut target = hero();
    let mut name = Object::new();
    name.set("type", "string").unwrap();
    name.set("regex", Regex::new("^(jim|jan)$").unwrap()).unwrap();
    let schema: Object = [("name", Value::Object(name))].into_iter().collect();

    let object = check(&mut target, &Value::Object(schema), None)
        .unwrap()
        .as_object_mut()
        .unwrap();
    assert!(object.set("name", "joe").is_err());
    assert!(object.set("name", "jim").is_ok());
}

#[test]
fn test_malformed_pattern_is_dropped_with_warning() {
    let recorder = Arc::new(RecordingDiagnostics::new());
    let checker = SchemaChecker::new().with_diagnostics(recorder.clone());

    let mut target = hero();
    let schema = Value::from(json!({"name": {"type": "string", "regex": "^(jim|jan)$"}}));
    let object = checker
        .check(&mut target, &schema)
        .unwrap()
        .as_object_mut()
        .unwrap();

    validate_one(object, "name", Some("joe".into()), Some("joe".into()), false);
    assert_eq!(recorder.count(Level::Warn), 1);
}

// ---------------------------------------------------------------------------
// Silent mode
// ---------------------------------------------------------------------------

#[test]
fn test_silent_mode_keeps_prior_value() {
    let mut target = hero();
    let object = governed_silent(
        &mut target,
        json!({
            "name": {"type": "string"},
            "life": {"type": "number", "max": 10}
        }),
    );

    assert_eq!(object.set("name", 5).unwrap(), WriteOutcome::Rejected);
    assert_eq!(object.set("life", 11).unwrap(), WriteOutcome::Rejected);
    assert_eq!(object.set("life", "ten").unwrap(), WriteOutcome::Rejected);
    validate_one(object, "name", None, Some("test".into()), false);
    validate_one(object, "life", None, Some(5.into()), false);
}

#[test]
fn test_silent_mode_reports_rejections() {
    let recorder = Arc::new(RecordingDiagnostics::new());
    let checker = SchemaChecker::new()
        .with_options(CheckOptions::silent())
        .with_diagnostics(recorder.clone());

    let mut target = hero();
    let schema = Value::from(json!({"life": {"type": "number"}}));
    let object = checker
        .check(&mut target, &schema)
        .unwrap()
        .as_object_mut()
        .unwrap();

    object.set("life", "x").unwrap();
    object.set("life", 7).unwrap();

    let errors: Vec<_> = recorder
        .events()
        .into_iter()
        .filter(|event| event.level == Level::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "life");
}

#[test]
fn test_silent_mode_does_not_silence_schema_errors() {
    let mut target = hero();
    let err = check(
        &mut target,
        &Value::from(json!({"life": {"type": "string"}})),
        Some(CheckOptions::silent()),
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::InitialTypeMismatch { .. }));
}

// ---------------------------------------------------------------------------
// Nested composition
// ---------------------------------------------------------------------------

fn nested_schema() -> serde_json::Value {
    json!({
        "name": {"type": "string"},
        "skills": {
            "sword": {"type": "number"},
            "specialization": {"type": "string"}
        }
    })
}

#[test]
fn test_nested_writes_succeed() {
    let mut target = Value::from(json!({
        "name": "test",
        "skills": {"sword": 5, "specialization": "magic"}
    }));
    let object = governed(&mut target, nested_schema());

    object.set("name", "john").unwrap();
    let mut skills = object.object_mut("skills").unwrap();
    skills.set("sword", 10).unwrap();
    skills.set("specialization", "sword").unwrap();

    assert_eq!(object.get("name"), Some(&Value::from("john")));
    let skills = object.get("skills").unwrap().as_object().unwrap();
    assert_eq!(skills.get("sword"), Some(&Value::from(10)));
    assert_eq!(skills.get("specialization"), Some(&Value::from("sword")));
}

#[test]
fn test_nested_type_violation_keeps_prior_value() {
    let mut target = Value::from(json!({
        "name": "test",
        "skills": {"sword": 5, "specialization": "magic"}
    }));
    let object = governed(&mut target, nested_schema());
    let mut skills = object.object_mut("skills").unwrap();

    let err = skills.set("sword", "10").unwrap_err();
    assert_eq!(err.field(), "skills.sword");
    assert!(matches!(err, WriteError::TypeMismatch { .. }));
    assert_eq!(skills.get("sword"), Some(&Value::from(5)));
}

#[test]
fn test_nested_fields_are_governed_on_the_nested_object() {
    let mut target = Value::from(json!({
        "name": "test",
        "skills": {"sword": 5, "specialization": "magic"}
    }));
    let object = governed(&mut target, nested_schema());

    assert!(object.is_governed("skills"));
    assert!(!object.contains_key("sword"));
    let skills = object.object_mut("skills").unwrap();
    assert!(skills.is_governed("sword"));
    assert!(skills.validator("sword").is_some());
    assert!(skills.validator("sword").unwrap().validate(&Value::from("x")).is_err());
}

#[test]
fn test_nested_fields_stay_governed_under_locked_parent() {
    let mut target = Value::from(json!({"name": "test", "skills": {"sword": 5}}));
    let object = governed(
        &mut target,
        json!({"skills": {"editable": false, "sword": {"type": "number"}}}),
    );

    let mut skills = object.object_mut("skills").unwrap();
    assert!(matches!(
        skills.remove("sword"),
        Err(WriteError::NotDeletable { .. })
    ));
    assert!(skills.set("sword", "not a number").is_err());
    skills.set("sword", 8).unwrap();

    assert_eq!(object.set("skills", Object::new()).unwrap(), WriteOutcome::Ignored);
    let skills = object.get("skills").unwrap().as_object().unwrap();
    assert!(skills.is_governed("sword"));
    assert_eq!(skills.get("sword"), Some(&Value::from(8)));
}

#[test]
fn test_nested_field_missing_from_object() {
    let mut target = hero();
    let err = check(
        &mut target,
        &Value::from(json!({"skills": {"archery": {"type": "number"}}})),
        None,
    )
    .unwrap_err();
    assert_eq!(err, SchemaError::MissingField("skills.archery".to_string()));
}

#[test]
fn test_replacing_nested_object_drops_nested_governance() {
    let mut target = Value::from(json!({
        "name": "test",
        "skills": {"sword": 5, "specialization": "magic"}
    }));
    let object = governed(&mut target, nested_schema());

    object
        .set("skills", Value::from(json!({"sword": 1, "specialization": "none"})))
        .unwrap();
    let mut skills = object.object_mut("skills").unwrap();
    assert!(!skills.is_governed("sword"));
    assert!(skills.set("sword", "anything").is_ok());
}

// ---------------------------------------------------------------------------
// Re-application and deletion
// ---------------------------------------------------------------------------

#[test]
fn test_reapplying_schema_keeps_current_values() {
    let mut target = Value::from(json!({
        "name": "test",
        "skills": {"sword": 5, "specialization": "magic"}
    }));
    governed(&mut target, nested_schema())
        .object_mut("skills")
        .unwrap()
        .set("sword", 9)
        .unwrap();

    let object = governed(&mut target, nested_schema());
    let skills = object.get("skills").unwrap().as_object().unwrap();
    assert_eq!(skills.get("sword"), Some(&Value::from(9)));
    assert_eq!(object.get("name"), Some(&Value::from("test")));
}

#[test]
fn test_governed_fields_are_protected_from_removal() {
    let mut target = hero();
    let object = governed(
        &mut target,
        json!({
            "name": {"type": "string"},
            "life": {"type": "number", "allow_delete": true}
        }),
    );

    assert!(matches!(
        object.remove("name"),
        Err(WriteError::NotDeletable { .. })
    ));
    assert_eq!(object.remove("life").unwrap(), Some(Value::from(5)));
    assert_eq!(object.remove("bags").unwrap(), Some(Value::from(json!(["cheese", "sandwich"]))));
}

#[test]
fn test_schema_order_is_application_order() {
    let mut target = Value::from(json!({"a": 1, "b": "two"}));
    let err = check(
        &mut target,
        &Value::from(json!({
            "a": {"type": "number"},
            "b": {"type": "number"},
            "c": {"type": "number"}
        })),
        None,
    )
    .unwrap_err();

    assert!(matches!(err, SchemaError::InitialTypeMismatch { ref field, .. } if field == "b"));
    assert!(target.as_object().unwrap().is_governed("a"));
}
