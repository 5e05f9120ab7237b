//! Binary-level tests for the typeweave CLI.

use assert_cmd::Command;
use predicates::prelude::*;

fn write_definition(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("order.json");
    std::fs::write(
        &path,
        serde_json::json!({
            "subject": {
                "name": "Order",
                "methods": [
                    {"name": "item", "params": ["string"], "returns": "Order"},
                    {"name": "note", "params": ["string"], "returns": "Order"},
                    {"name": "submit", "returns": "Receipt"}
                ]
            },
            "grammar": "item+ note? submit",
            "start": "order"
        })
        .to_string(),
    )
    .unwrap();
    path
}

#[test]
fn test_generate_prints_code() {
    let dir = tempfile::tempdir().unwrap();
    let definition = write_definition(dir.path());

    Command::cargo_bin("typeweave")
        .unwrap()
        .arg("generate")
        .arg(&definition)
        .assert()
        .success()
        .stdout(predicate::str::contains("export function order():"))
        .stdout(predicate::str::contains("export class Wrapper"))
        .stdout(predicate::str::contains("submit(): Receipt;"));
}

#[test]
fn test_generate_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let definition = write_definition(dir.path());

    let output = Command::cargo_bin("typeweave")
        .unwrap()
        .args(["--output", "json", "generate"])
        .arg(&definition)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(value["generated"]
        .as_str()
        .unwrap()
        .contains("export class Wrapper"));
}

#[test]
fn test_generate_injects_into_region() {
    let dir = tempfile::tempdir().unwrap();
    let definition = write_definition(dir.path());
    let target = dir.path().join("order.ts");
    std::fs::write(
        &target,
        "// typeweave:begin order-chain\n// stale\n// typeweave:end order-chain\n",
    )
    .unwrap();

    Command::cargo_bin("typeweave")
        .unwrap()
        .arg("generate")
        .arg(&definition)
        .args(["--into", target.to_str().unwrap(), "--region", "order-chain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rewritten"));

    let content = std::fs::read_to_string(&target).unwrap();
    assert!(content.contains("export class Wrapper"));
    assert!(!content.contains("// stale"));

    // Second run: nothing changed.
    Command::cargo_bin("typeweave")
        .unwrap()
        .arg("generate")
        .arg(&definition)
        .args(["--into", target.to_str().unwrap(), "--region", "order-chain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unchanged"));

    // Check mode agrees.
    Command::cargo_bin("typeweave")
        .unwrap()
        .arg("generate")
        .arg(&definition)
        .args([
            "--into",
            target.to_str().unwrap(),
            "--region",
            "order-chain",
            "--check",
        ])
        .assert()
        .success();
}

#[test]
fn test_check_fails_on_drift() {
    let dir = tempfile::tempdir().unwrap();
    let definition = write_definition(dir.path());
    let target = dir.path().join("order.ts");
    std::fs::write(
        &target,
        "// typeweave:begin order-chain\n// stale\n// typeweave:end order-chain\n",
    )
    .unwrap();

    Command::cargo_bin("typeweave")
        .unwrap()
        .arg("generate")
        .arg(&definition)
        .args([
            "--into",
            target.to_str().unwrap(),
            "--region",
            "order-chain",
            "--check",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of date"));
}

#[test]
fn test_bad_grammar_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        serde_json::json!({
            "subject": {"name": "Order", "methods": [{"name": "a", "returns": "Order"}]},
            "grammar": "a?"
        })
        .to_string(),
    )
    .unwrap();

    Command::cargo_bin("typeweave")
        .unwrap()
        .arg("generate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be optional"));
}
