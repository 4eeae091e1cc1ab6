//! Result archives: scored rounds and standings as JSON values, written canonically.
//!
//! Shapes:
//! - table:  `{ name, subject_label, score_label, direction, rows: [{ position, subject, score, picked_by? }] }`
//! - round:  `{ name, awards: [{ owner, rank, points, misses }], table }`
//! - status-only questions are written by the caller with their own fields.

use std::path::Path;

use pq_algo::{RankedTable, Round};
use pq_core::Score;
use serde_json::{Map as JsonMap, Number, Value};
use tracing::debug;

use crate::canonical_json::write_canonical_file;
use crate::IoError;

fn obj() -> JsonMap<String, Value> { JsonMap::new() }

fn num_f64(v: f64) -> Value {
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn score_json(s: &Score) -> Value {
    match s {
        Score::Int(v) => Value::from(*v),
        Score::Float(v) => num_f64(*v),
        Score::Text(t) => Value::String(t.clone()),
    }
}

/// A ranked table, rows in ranked order.
pub fn standings_value(table: &RankedTable) -> Value {
    let meta = table.meta();
    let mut o = obj();
    o.insert("name".into(), Value::String(meta.name.clone()));
    o.insert("subject_label".into(), Value::String(meta.subject_label.clone()));
    o.insert("score_label".into(), Value::String(meta.score_label.clone()));
    o.insert("direction".into(), Value::String(meta.direction.as_str().into()));

    let rows = table
        .ranked_rows()
        .iter()
        .map(|r| {
            let mut row = obj();
            row.insert("position".into(), Value::from(r.position()));
            row.insert("subject".into(), Value::String(r.subject().as_str().into()));
            row.insert("score".into(), score_json(r.score()));
            if !r.bound().is_empty() {
                row.insert(
                    "picked_by".into(),
                    Value::Array(r.bound().iter().map(|o| Value::String(o.as_str().into())).collect()),
                );
            }
            Value::Object(row)
        })
        .collect();
    o.insert("rows".into(), Value::Array(rows));
    Value::Object(o)
}

/// A scored round with its award list.
pub fn round_value(round: &Round) -> Value {
    let awards = round
        .awards()
        .iter()
        .map(|a| {
            let mut o = obj();
            o.insert("owner".into(), Value::String(a.owner.as_str().into()));
            o.insert("rank".into(), Value::from(a.rank));
            o.insert("points".into(), Value::from(a.points));
            o.insert("misses".into(), Value::Array(a.misses.iter().map(|m| num_f64(*m)).collect()));
            Value::Object(o)
        })
        .collect();

    let mut o = obj();
    o.insert("name".into(), Value::String(round.name().into()));
    o.insert("awards".into(), Value::Array(awards));
    o.insert("table".into(), standings_value(round.table()));
    Value::Object(o)
}

/// Write `value` as `<dir>/<stem>.json`.
pub fn write_archive(dir: &Path, stem: &str, value: &Value) -> Result<(), IoError> {
    if stem.is_empty() || stem.contains(['/', '\\']) || stem.starts_with('.') {
        return Err(IoError::Invalid(format!("archive name {stem:?} is not a plain file name")));
    }
    let path = dir.join(format!("{stem}.json"));
    write_canonical_file(&path, value)?;
    debug!(path = %path.display(), "archive written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use pq_core::OwnerId;
    use serde_json::json;

    fn owner(s: &str) -> OwnerId { s.parse().unwrap() }

    #[test]
    fn round_archive_shape() {
        let round = Round::from_points("Bingo", [(owner("Alice"), 6), (owner("Bob"), 2)]);
        assert_json_eq!(
            round_value(&round),
            json!({
                "name": "Bingo",
                "awards": [
                    {"owner": "Alice", "rank": 1, "points": 6, "misses": []},
                    {"owner": "Bob", "rank": 2, "points": 2, "misses": []}
                ],
                "table": {
                    "name": "Bingo",
                    "subject_label": "Entry",
                    "score_label": "Points",
                    "direction": "descending",
                    "rows": [
                        {"position": 1, "subject": "Alice", "score": 6},
                        {"position": 2, "subject": "Bob", "score": 2}
                    ]
                }
            })
        );
    }

    #[test]
    fn archive_names_must_be_plain() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_archive(dir.path(), "../escape", &json!({})).is_err());
        write_archive(dir.path(), "q1", &json!({"a": 1})).unwrap();
        assert!(dir.path().join("q1.json").exists());
    }
}
