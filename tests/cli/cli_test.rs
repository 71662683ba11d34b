//! CLI contract tests.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

const WORKSPACE: &str = r#"
[workspace]
features = ["bb.feature.access-control"]

[[workspace.policies]]
name = "policies/WORKSPACE_IAM"

[[workspace.policies.bindings]]
role = "roles/QUERIER"
condition = { op = "in", left = { field = "resource.environment_name" }, right = { value = ["staging"] } }

[[workspace.users]]
email = "dev@example.com"
role = "DEVELOPER"
"#;

fn dbguard() -> Command {
    match Command::cargo_bin("dbguard") {
        Ok(cmd) => cmd,
        Err(err) => panic!("binary should build: {err}"),
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn scope_prints_environments() {
    dbguard()
        .args([
            "scope",
            "--expr",
            r#"{"op":"in","left":{"field":"resource.environment_name"},"right":{"value":["staging","prod"]}}"#,
        ])
        .assert()
        .success()
        .stdout(contains(r#"["staging","prod"]"#));
}

#[test]
fn scope_prints_empty_for_other_shapes() {
    dbguard()
        .args(["scope", "--expr", r#"{"op":"empty"}"#])
        .assert()
        .success()
        .stdout(contains("[]"));
}

#[test]
fn check_grants_listed_environment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(dir.path(), "config.toml", WORKSPACE);

    dbguard()
        .arg("--config")
        .arg(&config)
        .args([
            "check",
            "--user",
            "dev@example.com",
            "--database",
            "orders",
            "--instance",
            "pg-main",
            "--environment",
            "staging",
        ])
        .assert()
        .success()
        .stdout(contains(r#""granted": true"#))
        .stdout(contains("decision").not());
}

#[test]
fn check_explain_names_deciding_step() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(dir.path(), "config.toml", WORKSPACE);

    dbguard()
        .arg("--config")
        .arg(&config)
        .args([
            "check",
            "--user",
            "dev@example.com",
            "--database",
            "orders",
            "--instance",
            "pg-main",
            "--environment",
            "staging",
            "--explain",
        ])
        .assert()
        .success()
        .stdout(contains(r#""granted": true"#))
        .stdout(contains(r#""decision""#))
        .stdout(contains("querier_binding"));
}

#[test]
fn check_explain_reports_denial() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(dir.path(), "config.toml", WORKSPACE);

    dbguard()
        .arg("--config")
        .arg(&config)
        .args([
            "check",
            "--user",
            "dev@example.com",
            "--database",
            "orders",
            "--instance",
            "pg-main",
            "--environment",
            "prod",
            "--explain",
        ])
        .assert()
        .success()
        .stdout(contains(r#""decision": "denied""#));
}

#[test]
fn check_denies_unlisted_environment_and_admin_connection() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(dir.path(), "config.toml", WORKSPACE);

    dbguard()
        .arg("--config")
        .arg(&config)
        .args([
            "check",
            "--user",
            "dev@example.com",
            "--database",
            "orders",
            "--instance",
            "pg-main",
            "--environment",
            "prod",
            "--connection",
            "admin",
        ])
        .assert()
        .success()
        .stdout(contains(r#""granted": false"#))
        .stdout(contains(r#""connection_allowed": false"#));
}

#[test]
fn check_rejects_unknown_user() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_file(dir.path(), "config.toml", WORKSPACE);

    dbguard()
        .arg("--config")
        .arg(&config)
        .args([
            "check",
            "--user",
            "ghost@example.com",
            "--database",
            "orders",
            "--instance",
            "pg-main",
            "--environment",
            "prod",
        ])
        .assert()
        .failure()
        .stderr(contains("unknown user"));
}

#[test]
fn resolve_reports_unbound_and_orphaned() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_file(
        dir.path(),
        "approval.json",
        r#"{
            "rules": [{"uid": "r1"}, {"uid": "r3"}],
            "parsed": [{"source": "DDL", "level": 300, "rule": "r2"}],
            "unrecognized": [{"rule": "r1"}]
        }"#,
    );

    dbguard()
        .arg("resolve")
        .arg("--file")
        .arg(&doc)
        .assert()
        .success()
        .stdout(contains(r#""rule": "r2""#))
        .stdout(contains(r#""kind": "parsed""#))
        .stdout(contains(r#""r3""#));
}

#[test]
fn resolve_fails_on_duplicate_uid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let doc = write_file(
        dir.path(),
        "approval.json",
        r#"{"rules": [{"uid": "r1"}, {"uid": "r1"}]}"#,
    );

    dbguard()
        .arg("resolve")
        .arg("--file")
        .arg(&doc)
        .assert()
        .failure()
        .stderr(contains("duplicate approval rule uid: r1"));
}
