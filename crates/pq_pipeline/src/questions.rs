//! Score one question document into a round.
//!
//! Every call builds its own tables, so binding never leaks between questions.

use std::collections::BTreeMap;

use pq_algo::rules::{self, BinaryPoints, HitMiss};
use pq_algo::{
    bind, bind_with_tie_break, score_by_distance, score_positional, score_positional_cascade,
    Criterion, Entry, RankedTable, Round, ScoreError, TableError,
};
use pq_io::{Contest, QuestionDoc, QuestionKind, ScheduleRef};
use pq_core::Schedule;

/// Why a question produced no round.
#[derive(Debug, Clone, PartialEq)]
pub enum Unscored {
    /// The real-world outcome is not known yet.
    Pending(String),
    /// Malformed input for this question.
    Failed(String),
}

/// Scoring errors are malformed input. The only not-yet-determined position
/// is the tie-breaker reach, checked before scoring starts.
impl From<ScoreError> for Unscored {
    fn from(e: ScoreError) -> Self { Unscored::Failed(e.to_string()) }
}

impl From<TableError> for Unscored {
    fn from(e: TableError) -> Self { ScoreError::Table(e).into() }
}

pub(crate) fn score_question(contest: &Contest, entries: &[Entry], q: &QuestionDoc) -> Result<Round, Unscored> {
    let name = q.title();
    match &q.kind {
        QuestionKind::Positional { table, field, answer, tie_breaker, award } => {
            let mut t = build_table(contest, table)?;
            let answer = schedule(contest, answer)?;
            let award = schedule(contest, award)?;
            match tie_breaker {
                Some(tb) => {
                    let tb_field = tb.field.as_str();
                    // A table still short of the tie-breaker position is an early season.
                    if tb.position as usize > t.len() {
                        let reach = TableError::PositionOutOfRange { pos: tb.position, rows: t.len() };
                        return Err(Unscored::Pending(reach.to_string()));
                    }
                    bind_with_tie_break(&mut t, entries, field, |e| e.guess(field), |e| e.number(tb_field))?;
                    let (_, round) = score_positional_cascade(
                        name,
                        &t,
                        entries,
                        &answer,
                        Some((tb.position, |e: &Entry| e.number(tb_field))),
                        &award,
                    )?;
                    Ok(round)
                }
                None => {
                    bind(&mut t, entries, field, |e| e.guess(field))?;
                    let (_, round) = score_positional_cascade(
                        name,
                        &t,
                        entries,
                        &answer,
                        None::<(u32, fn(&Entry) -> Option<f64>)>,
                        &award,
                    )?;
                    Ok(round)
                }
            }
        }
        QuestionKind::AnswerKey { table, field, answer } => {
            let mut t = build_table(contest, table)?;
            let answer = schedule(contest, answer)?;
            bind(&mut t, entries, field, |e| e.guess(field))?;
            let key = score_positional(&t, &answer, None)?;
            Ok(rules::answer_key_round(name, &t, entries, &key))
        }
        QuestionKind::Closest { criteria, award } => {
            let award = schedule(contest, award)?;
            let mut built = Vec::with_capacity(criteria.len());
            for c in criteria {
                let actual = c
                    .actual
                    .ok_or_else(|| Unscored::Pending(format!("{}: actual value not known yet", c.label)))?;
                let field = c.field.as_str();
                built.push(Criterion::numeric(c.label.clone(), actual, move |e: &Entry| e.number(field)));
            }
            Ok(score_by_distance(name, entries, &built, &award)?)
        }
        QuestionKind::PickValues { field, values } => {
            Ok(rules::pick_values_round(name, values, entries, field, |e| e.guess(field))?)
        }
        QuestionKind::HitMiss { field, correct, hit, wrong, missed } => {
            let correct = correct
                .as_ref()
                .ok_or_else(|| Unscored::Pending("correct subjects not known yet".into()))?;
            let points = HitMiss { hit: *hit, wrong: *wrong, missed: *missed };
            Ok(rules::hit_miss_round(name, correct, entries, field, |e| e.guess(field), points)?)
        }
        QuestionKind::Placement { table, field, matrix } => {
            let t = build_table(contest, table)?;
            Ok(rules::placement_matrix_round(name, &t, matrix, entries, field, |e| e.guess(field))?)
        }
        QuestionKind::Binary { field, answer, correct_yes, correct_no, incorrect } => {
            let answer = (*answer).ok_or_else(|| Unscored::Pending("answer not known yet".into()))?;
            let points = BinaryPoints { correct_yes: *correct_yes, correct_no: *correct_no, incorrect: *incorrect };
            Ok(rules::binary_choice_round(name, answer, entries, field, |e| e.flag(field), points)?)
        }
    }
}

fn build_table(contest: &Contest, name: &str) -> Result<RankedTable, Unscored> {
    let doc = contest
        .table(name)
        .ok_or_else(|| Unscored::Failed(format!("unknown table {name:?}")))?;
    doc.build().map_err(|e| Unscored::Failed(e.to_string()))
}

fn schedule(contest: &Contest, r: &ScheduleRef) -> Result<Schedule, Unscored> {
    contest.schedule(r).map_err(|e| Unscored::Failed(e.to_string()))
}

/// Points per owner, for callers that only need the numbers.
pub fn points_by_owner(round: &Round) -> BTreeMap<String, i64> {
    round.awards().iter().map(|a| (a.owner.to_string(), a.points)).collect()
}
