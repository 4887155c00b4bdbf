//! CLI surface tests: help output, default guidance, non-interactive
//! behavior, and config initialization.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_every_subcommand() {
    let mut cmd = Command::cargo_bin("verigate").unwrap();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("org"))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn running_without_arguments_shows_task_guidance() {
    let mut cmd = Command::cargo_bin("verigate").unwrap();

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("VERIGATE"))
        .stdout(predicate::str::contains("verigate verify --link"))
        .stdout(predicate::str::contains("EXAMPLE WORKFLOW:"))
        .stdout(predicate::str::contains("verigate org delete"));
}

#[test]
fn verify_help_documents_the_entry_parameters() {
    let mut cmd = Command::cargo_bin("verigate").unwrap();

    cmd.args(["verify", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--link"))
        .stdout(predicate::str::contains("--id"))
        .stdout(predicate::str::contains("--token"))
        .stdout(predicate::str::contains("--non-interactive"));
}

#[test]
fn non_interactive_verify_without_token_fails() {
    let temp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("verigate").unwrap();

    cmd.current_dir(temp.path())
        .args(["verify", "--non-interactive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("token"));
}

#[test]
fn link_conflicts_with_explicit_id_and_token() {
    let mut cmd = Command::cargo_bin("verigate").unwrap();

    cmd.args([
        "verify",
        "--link",
        "https://app.example.com/verify?id=u1&token=t",
        "--id",
        "u1",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn init_writes_a_default_config_file() {
    let temp = tempfile::tempdir().unwrap();

    Command::cargo_bin("verigate")
        .unwrap()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("verigate.toml"));

    let written = std::fs::read_to_string(temp.path().join("verigate.toml")).unwrap();
    assert!(written.contains("endpoint"));
    assert!(written.contains("[api.rate_limit]"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let temp = tempfile::tempdir().unwrap();

    Command::cargo_bin("verigate")
        .unwrap()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .success();

    Command::cargo_bin("verigate")
        .unwrap()
        .current_dir(temp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    Command::cargo_bin("verigate")
        .unwrap()
        .current_dir(temp.path())
        .args(["init", "--force"])
        .assert()
        .success();
}
