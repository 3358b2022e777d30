//! CLI integration tests for the strataconf binary.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DEFAULTS: &str = r#"
parent:
  string: string
  boolean: true
  nullable: value
server:
  port: 8080
"#;

fn strataconf() -> Command {
    let mut cmd = cargo_bin_cmd!("strataconf");
    // keep the developer's environment out of lookups
    cmd.env("NO_COLOR", "1")
        .env_remove("PARENT__STRING")
        .env_remove("SERVER__PORT");
    cmd
}

/// An application directory with config/defaults.yml and config/config.yml
fn app_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("config")).unwrap();
    fs::write(dir.path().join("config/defaults.yml"), DEFAULTS).unwrap();
    fs::write(
        dir.path().join("config/config.yml"),
        "parent:\n  boolean: false\n  nullable: null\nnotindefaults: 1\n",
    )
    .unwrap();
    dir
}

fn app_args(dir: &Path) -> Vec<String> {
    vec![
        "--app".into(),
        "strataconf-cli-test".into(),
        "--app-path".into(),
        dir.display().to_string(),
    ]
}

#[test]
fn test_get_scalar() {
    let dir = app_dir();
    strataconf()
        .arg("get")
        .arg("parent.string")
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout("string\n");
}

#[test]
fn test_get_overridden_values() {
    let dir = app_dir();
    strataconf()
        .args(["get", "parent.boolean"])
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout("false\n");

    strataconf()
        .args(["get", "parent.nullable"])
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout("null\n");
}

#[test]
fn test_get_mapping_as_json() {
    let dir = app_dir();
    let output = strataconf()
        .args(["get", "parent", "--format", "json"])
        .args(app_args(dir.path()))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"string": "string", "boolean": false, "nullable": null})
    );
}

#[test]
fn test_get_environment_override() {
    let dir = app_dir();
    strataconf()
        .env("PARENT__STRING", "from-env")
        .args(["get", "parent.string"])
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout("from-env\n");
}

#[test]
fn test_get_undeclared_key_fails() {
    let dir = app_dir();
    strataconf()
        .args(["get", "notindefaults"])
        .args(app_args(dir.path()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Could not find configuration for \"notindefaults\".",
        ));
}

#[test]
fn test_get_default_for_missing_key() {
    let dir = app_dir();
    strataconf()
        .args(["get", "does.not.exist", "--default", "fallback"])
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout("fallback\n");
}

#[test]
fn test_missing_defaults_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    strataconf()
        .args(["get", "parent.string"])
        .args(app_args(dir.path()))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Default file missing"));
}

#[test]
fn test_explicit_defaults_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let defaults = dir.path().join("defaults.yml");
    let first = dir.path().join("first.yml");
    let second = dir.path().join("second.json");
    fs::write(&defaults, DEFAULTS).unwrap();
    fs::write(&first, "server:\n  port: 9000\n").unwrap();
    fs::write(&second, r#"{"server": {"port": 9100}}"#).unwrap();

    strataconf()
        .args(["get", "server.port", "--app", "demo", "--defaults"])
        .arg(&defaults)
        .arg("--override")
        .arg(&first)
        .arg("--override")
        .arg(&second)
        .assert()
        .success()
        .stdout("9100\n");
}

#[test]
fn test_config_flag_wins_and_must_exist() {
    let dir = app_dir();
    let cli = dir.path().join("cli.yml");
    fs::write(&cli, "parent:\n  string: from-cli\n").unwrap();

    strataconf()
        .args(["get", "parent.string", "--config"])
        .arg(&cli)
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout("from-cli\n");

    strataconf()
        .args(["get", "parent.string", "--config"])
        .arg(dir.path().join("missing.yml"))
        .args(app_args(dir.path()))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_strict_flag_rejects_unknown_keys() {
    let dir = app_dir();
    strataconf()
        .args(["get", "parent.string", "--strict"])
        .args(app_args(dir.path()))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("notindefaults"));
}

#[test]
fn test_dump_yaml_excludes_undeclared_keys() {
    let dir = app_dir();
    strataconf()
        .arg("dump")
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains("boolean: false"))
        .stdout(predicate::str::contains("notindefaults").not());
}

#[test]
fn test_dump_sources() {
    let dir = app_dir();
    let config = dir.path().join("config/config.yml").display().to_string();
    strataconf()
        .args(["dump", "--sources"])
        .args(app_args(dir.path()))
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("parent.boolean: {}", config)));
}

#[test]
fn test_dump_to_file() {
    let dir = app_dir();
    let out = dir.path().join("out.json");
    strataconf()
        .args(["dump", "--format", "json", "--output"])
        .arg(&out)
        .args(app_args(dir.path()))
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["server"]["port"], 8080);
}

#[test]
fn test_paths_lists_candidates_in_order() {
    let dir = app_dir();
    let output = strataconf()
        .arg("paths")
        .args(app_args(dir.path()))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("defaults") && lines[0].ends_with("config/defaults.yml"));
    assert!(lines[1].ends_with("/etc/strataconf-cli-test/config.yml"));
    assert!(lines[2].ends_with("/private/etc/strataconf-cli-test/config.yml"));
    assert!(lines[3].ends_with("config/config.yml"));
    assert!(lines[4].ends_with("config.yml"));
}

#[test]
fn test_check_reports_valid_and_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.yml");
    let bad = dir.path().join("bad.json");
    fs::write(&good, "a: 1\n").unwrap();
    fs::write(&bad, "{\"a\": ").unwrap();

    strataconf()
        .arg("check")
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid YAML"));

    strataconf()
        .arg("check")
        .arg(&good)
        .arg(&bad)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bad.json"));
}

#[test]
fn test_app_is_required() {
    strataconf()
        .args(["get", "parent.string", "--defaults", "defaults.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--app"));
}
