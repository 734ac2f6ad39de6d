use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use camino::Utf8PathBuf;
use indoc::indoc;
use predicates::prelude::*;
use serde_json::Value;
use tape::utils::env::TapeEnvKey;

fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("crates/cassette/tests/fixtures")
}

fn tape() -> Command {
    let mut cmd = Command::cargo_bin("tape").unwrap();
    cmd.env("NO_COLOR", "1")
        .env_remove(TapeEnvKey::FixturesDir.to_string())
        .env_remove(TapeEnvKey::Config.to_string());
    cmd
}

#[test]
fn the_recorded_response_matches_itself() {
    tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .args(["diff", "getBusinessFromAreaQuery", "--response", "-"])
        .write_stdin(r#"{"data":{"businesses":{"size":897}}}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("matches its recording"));
}

#[test]
fn drift_is_reported_field_by_field() {
    tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .args(["diff", "getBusinessFromAreaQuery", "--response", "-"])
        .write_stdin(r#"{"data":{"businesses":{"size":912}}}"#)
        .assert()
        .failure()
        .stdout(predicate::str::contains("data.businesses.size"))
        .stdout(predicate::str::contains("897"))
        .stdout(predicate::str::contains("912"))
        .stderr(predicate::str::contains("error[E005]"));
}

#[test]
fn json_output_carries_the_reports() {
    let output = tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .args(["--format", "json"])
        .args(["diff", "getBusinessFromAreaQuery", "--response", "-"])
        .write_stdin(r#"{"data":{"businesses":{"size":897,"updatedAt":"today"}}}"#)
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["error"]["code"], "E005");
    let diff = &json["data"]["reports"][0]["diffs"][0];
    assert_eq!(diff["path"], "data.businesses.updatedAt");
    assert_eq!(diff["kind"], "unexpected");
    assert_eq!(diff["actual"], "today");
}

#[test]
fn config_rules_are_read_from_the_fixtures_dir() {
    let temp = TempDir::new().unwrap();
    temp.child("getBusinessFromAreaQuery.cs")
        .write_file(fixtures_dir().join("getBusinessFromAreaQuery.cs").as_std_path())
        .unwrap();
    temp.child("tape.toml")
        .write_str(indoc! {r#"
            [matching]
            tolerance = { "data.businesses.size" = "5%" }
        "#})
        .unwrap();

    tape()
        .arg("--fixtures")
        .arg(temp.path())
        .args(["diff", "getBusinessFromAreaQuery", "--response", "-"])
        .write_stdin(r#"{"data":{"businesses":{"size":912}}}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 tolerated"));
}

#[test]
fn cli_rules_are_added_to_the_config() {
    tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .args(["diff", "getBusinessFromAreaQuery", "--response", "-"])
        .args(["--ignore", "data.businesses.size"])
        .write_stdin(r#"{"data":{"businesses":{"size":1}}}"#)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 ignored"));
}

#[test]
fn invalid_config_files_are_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.child("tape.toml");
    config.write_str("[matching]\nignore = [\"data..size\"]\n").unwrap();

    tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .arg("--config")
        .arg(config.path())
        .args(["diff", "getBusinessFromAreaQuery", "--response", "-"])
        .write_stdin(r#"{"data":{"businesses":{"size":897}}}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E008]"));
}

#[test]
fn a_directory_of_responses_is_compared() {
    let responses = TempDir::new().unwrap();
    responses
        .child("getBusinessFromAreaQuery.json")
        .write_str(r#"{"data":{"businesses":{"size":897}}}"#)
        .unwrap();
    responses
        .child("getMapPlacesPredictions.json")
        .write_str(r#"{"data":{}}"#)
        .unwrap();

    // the second fixture has nothing recorded to compare against
    tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .arg("diff")
        .arg("--responses")
        .arg(responses.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[E007]"));
}

#[test]
fn a_stale_response_file_is_skipped_not_fatal() {
    let responses = TempDir::new().unwrap();
    responses
        .child("getBusinessFromAreaQuery.json")
        .write_str(r#"{"data":{"businesses":{"size":912}}}"#)
        .unwrap();
    responses
        .child("retiredQuery.json")
        .write_str(r#"{"data":{}}"#)
        .unwrap();

    let output = tape()
        .arg("--fixtures")
        .arg(fixtures_dir())
        .args(["--format", "json", "diff", "--responses"])
        .arg(responses.path())
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["error"]["code"], "E005");
    assert_eq!(json["data"]["reports"][0]["operationName"], "getBusinessFromAreaQuery");
    assert_eq!(json["data"]["skipped"][0]["operation"], "retiredQuery");
    assert_eq!(json["data"]["skipped"][0]["code"], "E004");
}
