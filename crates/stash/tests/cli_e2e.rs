#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn stash_cmd() -> Command {
    let mut cmd = Command::new(cargo_bin("stash"));
    cmd.env_remove("STASH_SEED_FILE")
        .env_remove("STASH_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_stats_reports_seed_counts() {
    stash_cmd()
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("media"))
        .stdout(predicate::str::contains("12"));
}

#[test]
fn test_json_list_prints_envelope() {
    let output = stash_cmd()
        .args(["media", "list", "--page-size", "5", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["meta"]["total"], 12);
    assert_eq!(envelope["data"]["meta"]["totalPages"], 3);
    assert_eq!(envelope["data"]["items"].as_array().unwrap().len(), 5);
    assert!(envelope["requestId"].as_str().unwrap().starts_with("req_"));
}

#[test]
fn test_missing_record_fails_with_code() {
    stash_cmd()
        .args(["media", "show", "med-nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error [not_found]"));
}

#[test]
fn test_json_errors_print_error_envelope() {
    let output = stash_cmd()
        .args(["tags", "rename", "beach", "hero", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["success"], false);
    assert_eq!(envelope["code"], "tag_exists");
    assert_eq!(envelope["status"], 409);
}

#[test]
fn test_unknown_criterion_is_rejected() {
    stash_cmd()
        .args(["media", "list", "-w", "colour=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error [invalid_request]"))
        .stderr(predicate::str::contains("colour"));
}

#[test]
fn test_filtered_list_renders_table() {
    stash_cmd()
        .args(["media", "list", "-w", "starred=true", "--sort", "name"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpine-lake.jpg"))
        .stdout(predicate::str::contains("3 items"))
        .stdout(predicate::str::contains("jingle.mp3").not());
}

#[test]
fn test_folder_tree_draws_hierarchy() {
    stash_cmd()
        .args(["folders", "tree"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marketing"))
        .stdout(predicate::str::contains("└── "));
}

#[test]
fn test_shell_keeps_changes_between_lines() {
    stash_cmd()
        .arg("shell")
        .write_stdin("tags rename beach shore\nmedia list -w tags=shore --sort name\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("beach-sunset.jpg"))
        .stdout(predicate::str::contains("summer-banner.png"))
        .stdout(predicate::str::contains("2 items"));
}

#[test]
fn test_shell_continues_after_errors() {
    stash_cmd()
        .arg("shell")
        .write_stdin("media show med-nope\n# comment\nnot-a-command\nstats\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Error [not_found]"))
        .stdout(predicate::str::contains("collections"));
}

#[test]
fn test_login_checks_credentials() {
    stash_cmd()
        .args(["login", "maya@stash.dev", "stash-demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Maya Chen"));

    stash_cmd()
        .args(["login", "maya@stash.dev", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error [authentication_failed]"));
}

#[test]
fn test_config_file_changes_page_size() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stash.toml");
    fs::write(&path, "[query]\ndefault_page_size = 4\n").unwrap();

    let output = stash_cmd()
        .args(["media", "list", "--json", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(envelope["data"]["meta"]["pageSize"], 4);
}

#[test]
fn test_seed_file_override() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("seed.json");
    fs::write(
        &path,
        r#"{"folders":[],"media":[],"collections":[],"tags":[],"categories":[],"users":[]}"#,
    )
    .unwrap();

    stash_cmd()
        .env("STASH_SEED_FILE", &path)
        .args(["media", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No media found."));
}
