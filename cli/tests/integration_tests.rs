use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_schema-check")
}

fn write_json(dir: &TempDir, name: &str, json: serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).expect("failed to write json");
    path
}

/// Hero object and schema shared by most tests.
fn write_hero(dir: &TempDir) -> (PathBuf, PathBuf) {
    let object = write_json(
        dir,
        "hero.json",
        serde_json::json!({
            "name": "jim",
            "life": 5,
            "skills": {"sword": 3}
        }),
    );
    let schema = write_json(
        dir,
        "schema.json",
        serde_json::json!({
            "name": {"type": "string", "regex": {"$regex": "^(jim|jan)$"}},
            "life": {"type": "number", "min": 0, "max": 10},
            "skills": {
                "type": "object",
                "sword": {"type": "number", "max": 5}
            }
        }),
    );
    (object, schema)
}

fn run(args: &[&str], object: &Path, schema: &Path) -> Output {
    Command::new(bin())
        .args(args)
        .arg("--object")
        .arg(object)
        .arg("--schema")
        .arg(schema)
        .output()
        .expect("failed to run schema-check")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let start = stdout.find('{').expect("no JSON object in stdout");
    serde_json::from_str(&stdout[start..]).expect("stdout JSON should parse")
}

#[test]
fn check_prints_governed_object() {
    let dir = TempDir::new().unwrap();
    let (object, schema) = write_hero(&dir);

    let out = run(&["check"], &object, &schema);
    assert!(out.status.success(), "check should succeed: {out:?}");

    let json = stdout_json(&out);
    assert_eq!(json["name"], "jim");
    assert_eq!(json["skills"]["sword"], 3.0);
}

#[test]
fn check_fails_on_initial_type_mismatch() {
    let dir = TempDir::new().unwrap();
    let object = write_json(&dir, "hero.json", serde_json::json!({"life": "five"}));
    let schema = write_json(&dir, "schema.json", serde_json::json!({"life": {"type": "number"}}));

    let out = run(&["check"], &object, &schema);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("life"), "stderr should name the field: {stderr}");
}

#[test]
fn check_fails_on_missing_nested_field() {
    let dir = TempDir::new().unwrap();
    let object = write_json(&dir, "hero.json", serde_json::json!({"name": "jim"}));
    let schema = write_json(
        &dir,
        "schema.json",
        serde_json::json!({"skills": {"sword": {"type": "number"}}}),
    );

    let out = run(&["check"], &object, &schema);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("skills"), "stderr: {stderr}");
}

#[test]
fn check_rejects_non_object_target() {
    let dir = TempDir::new().unwrap();
    let object = write_json(&dir, "hero.json", serde_json::json!([1, 2, 3]));
    let schema = write_json(&dir, "schema.json", serde_json::json!({}));

    let out = run(&["check"], &object, &schema);
    assert!(!out.status.success());
}

#[test]
fn write_reports_each_outcome_and_fails_on_violation() {
    let dir = TempDir::new().unwrap();
    let (object, schema) = write_hero(&dir);
    let writes = write_json(
        &dir,
        "writes.json",
        serde_json::json!([
            {"path": "name", "value": "jan"},
            {"path": "life", "value": 11},
            {"path": "skills.sword", "value": 4},
            {"path": "gold", "value": 100}
        ]),
    );

    let out = Command::new(bin())
        .arg("write")
        .arg("--object")
        .arg(&object)
        .arg("--schema")
        .arg(&schema)
        .arg("--writes")
        .arg(&writes)
        .output()
        .expect("failed to run schema-check");

    assert!(!out.status.success(), "a rejected write should fail the run");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("name: committed"), "stdout: {stdout}");
    assert!(stdout.contains("life: error:"), "stdout: {stdout}");
    assert!(stdout.contains("skills.sword: committed"), "stdout: {stdout}");
    assert!(stdout.contains("gold: committed"), "stdout: {stdout}");

    let json = stdout_json(&out);
    assert_eq!(json["name"], "jan");
    assert_eq!(json["life"], 5.0);
    assert_eq!(json["skills"]["sword"], 4.0);
    assert_eq!(json["gold"], 100.0);
}

#[test]
fn write_in_silent_mode_drops_rejected_values() {
    let dir = TempDir::new().unwrap();
    let (object, schema) = write_hero(&dir);
    let writes = write_json(
        &dir,
        "writes.json",
        serde_json::json!([
            {"path": "name", "value": "joe"},
            {"path": "life", "value": null},
            {"path": "name", "delete": true}
        ]),
    );

    let out = Command::new(bin())
        .arg("write")
        .arg("--silent")
        .arg("--object")
        .arg(&object)
        .arg("--schema")
        .arg(&schema)
        .arg("--writes")
        .arg(&writes)
        .output()
        .expect("failed to run schema-check");

    assert!(out.status.success(), "silent mode should not fail: {out:?}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("name: rejected"), "stdout: {stdout}");
    assert!(stdout.contains("life: rejected"), "stdout: {stdout}");
    assert!(stdout.contains("name: unchanged"), "stdout: {stdout}");

    let json = stdout_json(&out);
    assert_eq!(json["name"], "jim");
    assert_eq!(json["life"], 5.0);
}

#[test]
fn config_file_enables_silent_mode() {
    let dir = TempDir::new().unwrap();
    let (object, schema) = write_hero(&dir);
    let config = dir.path().join("schema-check.yml");
    fs::write(&config, "options:\n  throw_error: false\n").unwrap();
    let writes = write_json(
        &dir,
        "writes.json",
        serde_json::json!([{"path": "life", "value": -1}]),
    );

    let out = Command::new(bin())
        .arg("write")
        .arg("--config")
        .arg(&config)
        .arg("--object")
        .arg(&object)
        .arg("--schema")
        .arg(&schema)
        .arg("--writes")
        .arg(&writes)
        .output()
        .expect("failed to run schema-check");

    assert!(out.status.success(), "config should select silent mode: {out:?}");
    assert!(String::from_utf8_lossy(&out.stdout).contains("life: rejected"));
}

#[test]
fn write_fails_on_unknown_path() {
    let dir = TempDir::new().unwrap();
    let (object, schema) = write_hero(&dir);
    let writes = write_json(
        &dir,
        "writes.json",
        serde_json::json!([{"path": "inventory.slot", "value": 1}]),
    );

    let out = Command::new(bin())
        .arg("write")
        .arg("--object")
        .arg(&object)
        .arg("--schema")
        .arg(&schema)
        .arg("--writes")
        .arg(&writes)
        .output()
        .expect("failed to run schema-check");

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("inventory.slot: error:"));
}
