use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn it_explains_error_codes() {
    let mut cmd = Command::cargo_bin("tape").unwrap();
    cmd.env("NO_COLOR", "1")
        .args(["explain", "E005"])
        .assert()
        .success()
        .stdout(predicate::str::contains("E005"))
        .stdout(predicate::str::contains("--tolerance"));
}

#[test]
fn it_rejects_unknown_codes() {
    let mut cmd = Command::cargo_bin("tape").unwrap();
    cmd.args(["explain", "E999"]).assert().failure();
}
