#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const AUTH_SPEC: &str = "# Auth Specification

## Purpose
Authentication requirements for the web console and its public API.

## Requirements

### Requirement: Login
The system SHALL authenticate users with email and password.

#### Scenario: Valid credentials
- **WHEN** a user submits valid credentials
- **THEN** a session is created
";

const PROPOSAL: &str = "# Change: Add logout

## Why
Users on shared machines have no way to end their session, which leaves accounts exposed.

## What Changes
- **auth:** Add logout requirement
";

const LOGOUT_DELTA: &str = "## ADDED Requirements

### Requirement: Logout
The system SHALL end the session when the user logs out.

#### Scenario: Click logout
- **WHEN** the user clicks logout
- **THEN** the session ends
";

fn openspec(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("openspec").unwrap();
    cmd.current_dir(dir.path())
        .env("OPENSPEC_ROOT", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn seed_project(dir: &TempDir) {
    let root = dir.path();
    write(root, "openspec/specs/auth/spec.md", AUTH_SPEC);
    write(root, "openspec/changes/add-logout/proposal.md", PROPOSAL);
    write(
        root,
        "openspec/changes/add-logout/tasks.md",
        "- [x] 1.1 Add endpoint\n- [ ] 1.2 Add button\n",
    );
    write(
        root,
        "openspec/changes/add-logout/specs/auth/spec.md",
        LOGOUT_DELTA,
    );
}

// ---------------------------------------------------------------------------
// openspec validate
// ---------------------------------------------------------------------------

#[test]
fn validate_spec_passes() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["validate", "auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spec 'auth' is valid"));
}

#[test]
fn validate_change_passes_with_delta_files() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["validate", "add-logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("change 'add-logout' is valid"));
}

#[test]
fn validate_reports_missing_keyword_and_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(
        dir.path(),
        "openspec/specs/auth/spec.md",
        &AUTH_SPEC.replace("SHALL authenticate", "authenticates"),
    );
    openspec(&dir)
        .args(["validate", "auth"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Requirement must contain SHALL or MUST keyword",
        ))
        .stderr(predicate::str::contains("has validation errors"));
}

#[test]
fn validate_strict_flag_fails_on_warnings() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(
        dir.path(),
        "openspec/specs/auth/spec.md",
        &AUTH_SPEC.replace(
            "Authentication requirements for the web console and its public API.",
            "Auth.",
        ),
    );
    openspec(&dir).args(["validate", "auth"]).assert().success();
    openspec(&dir)
        .args(["validate", "auth", "--strict"])
        .assert()
        .failure();
}

#[test]
fn validate_strict_from_config() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(
        dir.path(),
        "openspec/specs/auth/spec.md",
        &AUTH_SPEC.replace(
            "Authentication requirements for the web console and its public API.",
            "Auth.",
        ),
    );
    write(dir.path(), "openspec/config.yaml", "validation:\n  strict: true\n");
    openspec(&dir).args(["validate", "auth"]).assert().failure();
}

#[test]
fn validate_json_bulk_shape() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    let output = openspec(&dir)
        .args(["validate", "--all", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["version"], "1.0");
    assert_eq!(value["summary"]["totals"]["items"], 2);
    assert_eq!(value["summary"]["totals"]["passed"], 2);
    assert_eq!(value["summary"]["byType"]["spec"]["items"], 1);
    assert_eq!(value["items"][0]["type"], "spec");
    assert_eq!(value["items"][1]["id"], "add-logout");
}

#[test]
fn validate_ambiguous_item() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(dir.path(), "openspec/changes/auth/proposal.md", PROPOSAL);
    openspec(&dir)
        .args(["validate", "auth"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ambiguous item"));
    openspec(&dir)
        .args(["validate", "auth", "--type", "spec"])
        .assert()
        .success();
}

#[test]
fn validate_unknown_item() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["validate", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown item 'ghost'"));
}

#[test]
fn validate_without_target() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to validate. Try one of:"));
}

#[test]
fn validate_conflicting_delta() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(
        dir.path(),
        "openspec/changes/add-logout/specs/auth/spec.md",
        "## MODIFIED Requirements\n\n### Requirement: Login\nThe system SHALL lock accounts.\n\n#### Scenario: Lock\n- **WHEN** five failures\n- **THEN** the account locks\n\n## REMOVED Requirements\n\n### Requirement: Login\n",
    );
    openspec(&dir)
        .args(["validate", "add-logout"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("MODIFIED and REMOVED"));
}

// ---------------------------------------------------------------------------
// openspec spec / change
// ---------------------------------------------------------------------------

#[test]
fn spec_list_and_show() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["spec", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"));

    openspec(&dir)
        .args(["spec", "show", "auth"])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Requirement: Login"));

    let output = openspec(&dir)
        .args(["spec", "show", "auth", "--json", "--no-scenarios"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["name"], "auth");
    assert_eq!(value["requirements"][0]["name"], "Login");
    assert_eq!(value["requirements"][0]["scenarios"].as_array().unwrap().len(), 0);
}

#[test]
fn spec_show_requirement_out_of_range() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["spec", "show", "auth", "-r", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requirement 5 not found"));
}

#[test]
fn change_list_shows_progress() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(dir.path(), "openspec/changes/archive/2024-01-01-old/proposal.md", PROPOSAL);
    openspec(&dir)
        .args(["change", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add-logout"))
        .stdout(predicate::str::contains("1/2 tasks"))
        .stdout(predicate::str::contains("2024-01-01-old").not());
}

#[test]
fn change_show_deltas_json() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    let output = openspec(&dir)
        .args(["change", "show", "add-logout", "--deltas-only", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["deltaCount"], 1);
    assert_eq!(value["deltas"][0]["operation"], "ADDED");
    assert_eq!(value["deltas"][0]["description"], "Add requirement: Logout");
}

// ---------------------------------------------------------------------------
// openspec archive
// ---------------------------------------------------------------------------

#[test]
fn archive_merges_and_moves() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["archive", "add-logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 incomplete task(s)"))
        .stdout(predicate::str::contains("auth: update"))
        .stdout(predicate::str::contains("archived as"));

    let spec = fs::read_to_string(dir.path().join("openspec/specs/auth/spec.md")).unwrap();
    assert!(spec.contains("### Requirement: Login"));
    assert!(spec.contains("### Requirement: Logout"));
    assert!(!dir.path().join("openspec/changes/add-logout").exists());

    let archived: Vec<_> = fs::read_dir(dir.path().join("openspec/changes/archive"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].ends_with("-add-logout"));
}

#[test]
fn archive_skip_specs_leaves_specs_untouched() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["archive", "add-logout", "--skip-specs"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(dir.path().join("openspec/specs/auth/spec.md")).unwrap(),
        AUTH_SPEC
    );
}

#[test]
fn archive_failed_merge_changes_nothing() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    write(
        dir.path(),
        "openspec/changes/add-logout/specs/auth/spec.md",
        "## REMOVED Requirements\n\n### Requirement: Ghost\n",
    );
    openspec(&dir)
        .args(["archive", "add-logout"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("REMOVED failed"));
    assert_eq!(
        fs::read_to_string(dir.path().join("openspec/specs/auth/spec.md")).unwrap(),
        AUTH_SPEC
    );
    assert!(dir.path().join("openspec/changes/add-logout").exists());
}

#[test]
fn archive_unknown_change() {
    let dir = TempDir::new().unwrap();
    seed_project(&dir);
    openspec(&dir)
        .args(["archive", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("change 'ghost' not found"));
}

// ---------------------------------------------------------------------------
// openspec config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_defaults() {
    let dir = TempDir::new().unwrap();
    openspec(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_bad_version() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "openspec/config.yaml", "version: 9\n");
    openspec(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unsupported config version 9"));
}
