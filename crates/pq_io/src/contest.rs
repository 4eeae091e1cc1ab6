//! On-disk contest document.
//!
//! ```json
//! {
//!   "name": "2021 season",
//!   "schedules": { "top5": { "1": 25, "2": 18, "3": 15, "4": 12, "5": 10 } },
//!   "tables": [{ "name": "Constructors", "subject_label": "Team", "score_label": "Points",
//!                "score_type": "int", "direction": "descending",
//!                "rows": [{ "subject": "Mercedes", "score": 573 }] }],
//!   "entries": [{ "owner": "Alice", "responses": { "fifth": "Alpine", "fifth_pts": 150 } }],
//!   "questions": [{ "id": "team-fifth", "kind": "positional", "table": "Constructors",
//!                   "field": "fifth", "answer": "top5", "award": "f1",
//!                   "tie_breaker": { "position": 5, "field": "fifth_pts" } }]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use pq_algo::{Entry, Guess, RankedTable, Response, TableError};
use pq_core::{OwnerId, Schedule, Score, ScoreType, SortDirection, Subject};
use serde::{Deserialize, Serialize};

use crate::IoError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contest {
    pub name: String,
    /// Named, reusable schedules. `f1` and `sprint` are always available too.
    #[serde(default)]
    pub schedules: BTreeMap<String, Schedule>,
    #[serde(default)]
    pub tables: Vec<TableDoc>,
    pub entries: Vec<EntryDoc>,
    pub questions: Vec<QuestionDoc>,
}

impl Contest {
    pub fn table(&self, name: &str) -> Option<&TableDoc> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Resolve a schedule reference: inline, contest-defined, or built-in.
    pub fn schedule(&self, r: &ScheduleRef) -> Result<Schedule, IoError> {
        match r {
            ScheduleRef::Named(n) => self
                .schedules
                .get(n)
                .cloned()
                .or_else(|| Schedule::builtin(n))
                .ok_or_else(|| IoError::Invalid(format!("unknown schedule {n:?}"))),
            ScheduleRef::Inline(map) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (rank, pts) in map {
                    let rank: u32 = rank
                        .trim()
                        .parse()
                        .map_err(|_| IoError::Invalid(format!("schedule rank {rank:?} is not a number")))?;
                    pairs.push((rank, *pts));
                }
                Schedule::new(pairs).map_err(|e| IoError::Invalid(e.to_string()))
            }
        }
    }

    /// Entries converted to their scoring form, in file order.
    pub fn to_entries(&self) -> Vec<Entry> {
        self.entries.iter().map(EntryDoc::to_entry).collect()
    }
}

/// Real-world outcome table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDoc {
    pub name: String,
    #[serde(default = "default_subject_label")]
    pub subject_label: String,
    #[serde(default = "default_score_label")]
    pub score_label: String,
    pub score_type: ScoreType,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub rows: Vec<RowDoc>,
}

fn default_subject_label() -> String { "Subject".into() }
fn default_score_label() -> String { "Score".into() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowDoc {
    pub subject: Subject,
    pub score: Score,
}

impl TableDoc {
    /// Build a fresh ranked table. Whole-number scores in a float table are widened.
    pub fn build(&self) -> Result<RankedTable, TableError> {
        let mut table = RankedTable::new(
            self.name.clone(),
            self.subject_label.clone(),
            self.score_label.clone(),
            self.score_type,
            self.direction,
        );
        for row in &self.rows {
            let score = match (&row.score, self.score_type) {
                (Score::Int(v), ScoreType::Float) => Score::Float(*v as f64),
                (s, _) => s.clone(),
            };
            table.add_subject(score, row.subject.clone())?;
        }
        Ok(table)
    }
}

/// One participant's form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryDoc {
    pub owner: OwnerId,
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseDoc>,
}

impl EntryDoc {
    pub fn to_entry(&self) -> Entry {
        let mut entry = Entry::new(self.owner.clone());
        for (field, r) in &self.responses {
            entry.insert(field.clone(), r.to_response());
        }
        entry
    }
}

/// A response as written in JSON: `true`, `155`, `"Alpine"`, or `["HAM", "VER"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseDoc {
    Flag(bool),
    Number(f64),
    Pick(Subject),
    Picks(Vec<Subject>),
}

impl ResponseDoc {
    pub fn to_response(&self) -> Response {
        match self {
            ResponseDoc::Flag(b) => Response::Flag(*b),
            ResponseDoc::Number(v) => Response::Number(*v),
            ResponseDoc::Pick(s) => Response::Pick(Guess::Scalar(s.clone())),
            ResponseDoc::Picks(v) => Response::Pick(Guess::MultiPick(v.clone())),
        }
    }
}

/// A schedule given by name (`"f1"`, or a key of `schedules`) or inline as
/// `{"rank": points}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleRef {
    Named(String),
    // String keys: untagged content is buffered and cannot re-parse integer map keys.
    Inline(BTreeMap<String, i64>),
}

impl Default for ScheduleRef {
    fn default() -> Self { ScheduleRef::Named("f1".into()) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TieBreakerDoc {
    /// Table position whose score is the target.
    pub position: u32,
    /// Numeric response holding each entry's tie-break guess.
    pub field: String,
}

/// One level of a `closest` cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriterionDoc {
    pub label: String,
    pub field: String,
    /// Actual value; absent while not yet known.
    #[serde(default)]
    pub actual: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDoc {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl QuestionDoc {
    pub fn title(&self) -> &str { self.title.as_deref().unwrap_or(&self.id) }
}

/// Question kinds, tagged by `kind`.
///
/// `answer` / `award` schedules default to `f1` when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Pick a subject; points from its table position, cascaded with an optional tie-breaker.
    Positional {
        table: String,
        field: String,
        #[serde(default)]
        answer: ScheduleRef,
        #[serde(default)]
        tie_breaker: Option<TieBreakerDoc>,
        #[serde(default)]
        award: ScheduleRef,
    },
    /// Pick a subject; earn the answer-key value of its position directly.
    AnswerKey {
        table: String,
        field: String,
        #[serde(default)]
        answer: ScheduleRef,
    },
    /// Numeric guesses ranked by distance over one or more criteria.
    Closest {
        criteria: Vec<CriterionDoc>,
        #[serde(default)]
        award: ScheduleRef,
    },
    /// Sum per-subject values over the picks.
    PickValues {
        field: String,
        values: BTreeMap<Subject, i64>,
    },
    /// Multi-pick scored against a set of correct subjects.
    HitMiss {
        field: String,
        /// Correct subjects; absent while not yet known.
        #[serde(default)]
        correct: Option<BTreeSet<Subject>>,
        hit: i64,
        wrong: i64,
        missed: i64,
    },
    /// Ordered top-N picks scored through a points matrix.
    Placement {
        table: String,
        field: String,
        matrix: Vec<Vec<i64>>,
    },
    /// Yes/no question.
    Binary {
        field: String,
        #[serde(default)]
        answer: Option<bool>,
        correct_yes: i64,
        correct_no: i64,
        incorrect: i64,
    },
}

impl QuestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::Positional { .. } => "positional",
            QuestionKind::AnswerKey { .. } => "answer_key",
            QuestionKind::Closest { .. } => "closest",
            QuestionKind::PickValues { .. } => "pick_values",
            QuestionKind::HitMiss { .. } => "hit_miss",
            QuestionKind::Placement { .. } => "placement",
            QuestionKind::Binary { .. } => "binary",
        }
    }

    /// Outcome table this question reads, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            QuestionKind::Positional { table, .. }
            | QuestionKind::AnswerKey { table, .. }
            | QuestionKind::Placement { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Schedules this question references.
    pub fn schedules(&self) -> Vec<&ScheduleRef> {
        match self {
            QuestionKind::Positional { answer, award, .. } => vec![answer, award],
            QuestionKind::AnswerKey { answer, .. } => vec![answer],
            QuestionKind::Closest { award, .. } => vec![award],
            _ => Vec::new(),
        }
    }
}
