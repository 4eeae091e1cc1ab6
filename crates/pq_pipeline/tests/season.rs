//! Whole-contest runs over the season fixture.

use std::path::PathBuf;

use pq_core::OwnerId;
use pq_pipeline::{archive_outcome, points_by_owner, run_contest, run_contest_file, QuestionStatus};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/season.json")
}

fn owner(s: &str) -> OwnerId {
    match s.parse() {
        Ok(o) => o,
        Err(err) => panic!("test failure: {err}"),
    }
}

#[test]
fn every_kind_scores_and_totals_fold_once() {
    let outcome = run_contest_file(&fixture()).unwrap();

    let status: Vec<(&str, &str)> = outcome
        .questions
        .iter()
        .map(|q| (q.id.as_str(), q.status.as_str()))
        .collect();
    assert_eq!(
        status,
        vec![
            ("team-fifth", "scored"),
            ("champion", "scored"),
            ("unique-winners", "scored"),
            ("retirements", "scored"),
            ("podium-finishers", "scored"),
            ("top-three", "scored"),
            ("haas-points", "scored"),
            ("final-podium", "pending"),
        ]
    );

    let fifth = points_by_owner(outcome.questions[0].round.as_ref().unwrap());
    assert_eq!((fifth["Alice"], fifth["Bob"], fifth["Cara"]), (25, 18, 15));

    let top3 = points_by_owner(outcome.questions[5].round.as_ref().unwrap());
    assert_eq!((top3["Alice"], top3["Bob"], top3["Cara"]), (15, 11, 2));

    assert_eq!(outcome.ledger.total(&owner("Alice")), 60);
    assert_eq!(outcome.ledger.total(&owner("Bob")), 46);
    assert_eq!(outcome.ledger.total(&owner("Cara")), 9);
    assert_eq!(outcome.ledger.rounds().len(), 7);
    assert!(!outcome.has_failures());

    let order: Vec<&str> = outcome.standings.ranked_rows().iter().map(|r| r.subject().as_str()).collect();
    assert_eq!(order, vec!["Alice", "Bob", "Cara"]);
}

#[test]
fn malformed_question_fails_alone() {
    let text = std::fs::read_to_string(fixture()).unwrap();
    // Point the closest question at a response nobody gave.
    let text = text.replace(r#""field": "winners""#, r#""field": "winnerz""#);
    let contest = pq_io::parse_contest(&text).unwrap();
    let outcome = run_contest(&contest);

    let unique = &outcome.questions[2];
    assert!(matches!(&unique.status, QuestionStatus::Failed(r) if r.contains("missing response")));
    assert!(unique.round.is_none());
    assert!(outcome.has_failures());
    // Later questions still ran and counted.
    assert_eq!(outcome.questions[6].status, QuestionStatus::Scored);
    assert_eq!(outcome.ledger.total(&owner("Alice")), 50);
}

#[test]
fn short_table_leaves_positional_question_pending() {
    let text = std::fs::read_to_string(fixture()).unwrap();
    let text = text.replace(r#"{ "subject": "Alpine", "score": 155 }"#, "").replace(
        r#"{ "subject": "McLaren", "score": 296 },"#,
        r#"{ "subject": "McLaren", "score": 296 }"#,
    );
    let contest = pq_io::parse_contest(&text).unwrap();
    let outcome = run_contest(&contest);
    assert!(matches!(outcome.questions[0].status, QuestionStatus::Pending(_)));
    assert!(!outcome.has_failures());
}

#[test]
fn schedule_longer_than_table_fails_the_question() {
    let text = std::fs::read_to_string(fixture()).unwrap();
    // No answer schedule: the 20-place f1 default against 5 constructors.
    let text = text.replace(
        r#""table": "Drivers",
      "field": "champion",
      "answer": { "1": 10, "2": 5 }"#,
        r#""table": "Constructors",
      "field": "champion""#,
    );
    let contest = pq_io::parse_contest(&text).unwrap();
    let outcome = run_contest(&contest);

    let champion = &outcome.questions[1];
    assert_eq!(champion.id, "champion");
    assert!(matches!(&champion.status, QuestionStatus::Failed(r) if r.contains("out of range")));
    assert!(champion.round.is_none());
    assert!(outcome.has_failures());
    // The positional tie-breaker question on the same table still scores.
    assert_eq!(outcome.questions[0].status, QuestionStatus::Scored);
}

#[test]
fn placement_matrix_deeper_than_table_fails_the_question() {
    let text = std::fs::read_to_string(fixture()).unwrap();
    let deep = r#"[[5, 3, 1], [3, 5, 3], [1, 3, 5], [0], [0], [0], [0]]"#;
    let text = text.replace(r#"[[5, 3, 1], [3, 5, 3], [1, 3, 5]]"#, deep);
    let contest = pq_io::parse_contest(&text).unwrap();
    let outcome = run_contest(&contest);

    let top3 = &outcome.questions[5];
    assert_eq!(top3.id, "top-three");
    assert!(matches!(top3.status, QuestionStatus::Failed(_)));
    assert_eq!(outcome.failed().count(), 1);
}

#[test]
fn archive_writes_standings_and_one_file_per_question() {
    let outcome = run_contest_file(&fixture()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let written = archive_outcome(&outcome, dir.path()).unwrap();
    assert_eq!(written.len(), 1 + outcome.questions.len());

    let standings: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("standings.json")).unwrap()).unwrap();
    assert_eq!(standings["standings"]["rows"][0]["subject"], "Alice");
    assert_eq!(standings["standings"]["rows"][0]["score"], 60);

    let pending: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("final-podium.json")).unwrap()).unwrap();
    assert_eq!(pending["status"], "pending");
    assert!(pending.get("round").is_none());
}
