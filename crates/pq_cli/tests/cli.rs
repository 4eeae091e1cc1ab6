//! End-to-end runs of the `pq` binary over the season fixture.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/season.json")
}

fn pq() -> Command {
    match Command::cargo_bin("pq") {
        Ok(cmd) => cmd,
        Err(err) => panic!("test failure: {err}"),
    }
}

#[test]
fn text_render_prints_rounds_and_standings() {
    pq().arg("--contest")
        .arg(fixture())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fifth in the constructors' championship"))
        .stdout(predicate::str::contains("Final race podium [pending]"))
        .stdout(predicate::str::contains("2021 season"))
        .stdout(predicate::str::is_match(r"  1 Alice\s+60").unwrap());
}

#[test]
fn json_render_writes_archives() {
    let out = tempfile::tempdir().unwrap();
    pq().arg("--contest")
        .arg(fixture())
        .arg("--out")
        .arg(out.path())
        .args(["--render", "json", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let standings: serde_json::Value =
        serde_json::from_slice(&fs::read(out.path().join("standings.json")).unwrap()).unwrap();
    assert_eq!(standings["contest"], "2021 season");
    assert_eq!(standings["rounds"].as_array().map(Vec::len), Some(7));

    let fifth: serde_json::Value =
        serde_json::from_slice(&fs::read(out.path().join("team-fifth.json")).unwrap()).unwrap();
    assert_eq!(fifth["status"], "scored");
    assert_eq!(fifth["round"]["awards"][0]["owner"], "Alice");
    assert_eq!(fifth["round"]["awards"][0]["points"], 25);
}

#[test]
fn validate_only_does_not_score() {
    let out = tempfile::tempdir().unwrap();
    pq().arg("--contest")
        .arg(fixture())
        .arg("--out")
        .arg(out.path())
        .args(["--render", "json", "--validate-only"])
        .assert()
        .success()
        .stderr(predicate::str::contains("validate-only"));
    assert!(!out.path().join("standings.json").exists());
}

#[test]
fn failed_question_exits_five_but_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let text = fs::read_to_string(fixture()).unwrap().replace(r#""field": "winners""#, r#""field": "winnerz""#);
    let path = dir.path().join("broken.json");
    fs::write(&path, text).unwrap();

    pq().arg("--contest")
        .arg(&path)
        .arg("--quiet")
        .assert()
        .code(5)
        .stdout(predicate::str::contains("[failed]"))
        .stderr(predicate::str::contains("question unique-winners failed"));
}

#[test]
fn invalid_contest_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"name": "x", "entries": [], "questions": []}"#).unwrap();
    pq().arg("--contest").arg(&path).assert().code(2);
}

#[test]
fn missing_contest_file_exits_two() {
    pq().args(["--contest", "no/such/contest.json"]).assert().code(2);
}
