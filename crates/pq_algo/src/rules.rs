//! Reusable scoring rules built on tables, binding and rounds.
//!
//! None of these need the distance cascade; they turn picks straight into
//! point totals and hand them to [`Round::from_points`].

use std::collections::{BTreeMap, BTreeSet};

use pq_core::Subject;
use tracing::debug;

use crate::prediction::{Entry, Guess};
use crate::scorer::{AnswerKey, Round};
use crate::table::RankedTable;
use crate::{ScoreError, TableError};

fn missing(entry: &Entry, criterion: &str) -> ScoreError {
    ScoreError::MissingResponse {
        owner: entry.owner().clone(),
        criterion: criterion.to_string(),
    }
}

/// Each entry earns the answer-key value of every row it is bound to in `table`.
/// Entries bound nowhere (or only to unscheduled rows) score 0.
pub fn answer_key_round(name: &str, table: &RankedTable, entries: &[Entry], key: &AnswerKey) -> Round {
    let mut totals: BTreeMap<_, i64> = entries.iter().map(|e| (e.owner().clone(), 0)).collect();
    for row in table.ranked_rows() {
        let pts = key.points_for(row.subject()).unwrap_or(0);
        for owner in row.bound() {
            if let Some(t) = totals.get_mut(owner) {
                *t = t.saturating_add(pts);
            }
        }
    }
    Round::from_points(name, totals)
}

/// Sum of per-subject values over an entry's picks. Subjects absent from
/// `values` have not happened yet and count 0.
pub fn pick_values_round<G>(
    name: &str,
    values: &BTreeMap<Subject, i64>,
    entries: &[Entry],
    field: &str,
    guess: G,
) -> Result<Round, ScoreError>
where
    G: Fn(&Entry) -> Option<&Guess>,
{
    let mut totals = Vec::with_capacity(entries.len());
    for entry in entries {
        let picks = guess(entry).ok_or_else(|| missing(entry, field))?;
        let sum = picks
            .picks()
            .iter()
            .filter_map(|s| values.get(s))
            .fold(0i64, |acc, v| acc.saturating_add(*v));
        totals.push((entry.owner().clone(), sum));
    }
    Ok(Round::from_points(name, totals))
}

/// Points for a multi-pick checked against the set of correct subjects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitMiss {
    /// Per correct pick.
    pub hit: i64,
    /// Per pick that is not correct.
    pub wrong: i64,
    /// Per correct subject the entry did not pick.
    pub missed: i64,
}

/// Every element of the pick list is scored, so a repeated pick counts each
/// time. `missed` counts distinct correct subjects absent from the list.
pub fn hit_miss_round<G>(
    name: &str,
    correct: &BTreeSet<Subject>,
    entries: &[Entry],
    field: &str,
    guess: G,
    points: HitMiss,
) -> Result<Round, ScoreError>
where
    G: Fn(&Entry) -> Option<&Guess>,
{
    let mut totals = Vec::with_capacity(entries.len());
    for entry in entries {
        let picks = guess(entry).ok_or_else(|| missing(entry, field))?.picks();
        let hits = picks.iter().filter(|s| correct.contains(*s)).count() as i64;
        let wrong = picks.len() as i64 - hits;
        let found: BTreeSet<&Subject> = picks.iter().filter(|s| correct.contains(*s)).collect();
        let missed = (correct.len() - found.len()) as i64;
        let pts = hits
            .saturating_mul(points.hit)
            .saturating_add(wrong.saturating_mul(points.wrong))
            .saturating_add(missed.saturating_mul(points.missed));
        totals.push((entry.owner().clone(), pts));
    }
    Ok(Round::from_points(name, totals))
}

/// "Top N in order": row i of `matrix` holds the points for a subject that
/// actually finished in the i-th tie group position (1-based position i+1),
/// indexed by the slot the entry put it in.
///
/// A subject already placed by an earlier position keeps that row. Picks
/// outside the actual top N, or slots beyond a matrix row, score 0.
pub fn placement_matrix_round<G>(
    name: &str,
    table: &RankedTable,
    matrix: &[Vec<i64>],
    entries: &[Entry],
    field: &str,
    picks: G,
) -> Result<Round, ScoreError>
where
    G: Fn(&Entry) -> Option<&Guess>,
{
    let mut placed: BTreeMap<&Subject, &[i64]> = BTreeMap::new();
    for (i, row_points) in matrix.iter().enumerate() {
        for row in table.rows_at_position(i as u32 + 1)? {
            placed.entry(row.subject()).or_insert(row_points.as_slice());
        }
    }

    let mut totals = Vec::with_capacity(entries.len());
    for entry in entries {
        let slots = picks(entry).ok_or_else(|| missing(entry, field))?.picks();
        let sum = slots
            .iter()
            .enumerate()
            .filter_map(|(slot, s)| placed.get(s).and_then(|pts| pts.get(slot)))
            .fold(0i64, |acc, v| acc.saturating_add(*v));
        totals.push((entry.owner().clone(), sum));
    }
    debug!(round = name, placed = placed.len(), "placement matrix scored");
    Ok(Round::from_points(name, totals))
}

/// Points for a yes/no question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinaryPoints {
    pub correct_yes: i64,
    pub correct_no: i64,
    pub incorrect: i64,
}

pub fn binary_choice_round<F>(
    name: &str,
    answer: bool,
    entries: &[Entry],
    field: &str,
    flag: F,
    points: BinaryPoints,
) -> Result<Round, ScoreError>
where
    F: Fn(&Entry) -> Option<bool>,
{
    let mut totals = Vec::with_capacity(entries.len());
    for entry in entries {
        let said = flag(entry).ok_or_else(|| missing(entry, field))?;
        let pts = match (said == answer, answer) {
            (true, true) => points.correct_yes,
            (true, false) => points.correct_no,
            (false, _) => points.incorrect,
        };
        totals.push((entry.owner().clone(), pts));
    }
    Ok(Round::from_points(name, totals))
}

/// One round whose points are the per-owner sum of `rounds`.
pub fn combine_rounds(name: &str, rounds: &[Round]) -> Round {
    let mut totals = BTreeMap::new();
    for round in rounds {
        for award in round.awards() {
            let total = totals.entry(award.owner.clone()).or_insert(0i64);
            *total = total.saturating_add(award.points);
        }
    }
    Round::from_points(name, totals)
}

/// Subjects of the tie group at `pos`, for rules that need the actual answer set.
pub fn subjects_at(table: &RankedTable, pos: u32) -> Result<BTreeSet<Subject>, TableError> {
    Ok(table
        .rows_at_position(pos)?
        .iter()
        .map(|r| r.subject().clone())
        .collect())
}
