//! Cascading scorer: closeness → points under competition ranking.
//!
//! Two call shapes share one award walk:
//! - positional: outcome positions map to points through a schedule,
//!   giving an answer key and an optional tie-break target;
//! - distance: every entry gets a tuple of miss amounts (most significant
//!   first), entries with identical tuples tie, and the schedule is handed out
//!   by competition rank (three tied at 1 all get `schedule[1]`, the next group
//!   starts at rank 4).

use core::cmp::Ordering;
use std::collections::BTreeMap;

use pq_core::{OwnerId, Schedule, Subject};
use tracing::debug;

use crate::prediction::Entry;
use crate::table::RankedTable;
use crate::{ScoreError, TableError};

// ----------------------------- Criteria ----------------------------------------------

/// One level of the cascade: how far an entry is from the right answer.
pub struct Criterion<'a> {
    label: String,
    miss: Box<dyn Fn(&Entry) -> Option<f64> + 'a>,
}

impl<'a> Criterion<'a> {
    /// `|actual - guess|`.
    pub fn numeric<F>(label: impl Into<String>, actual: f64, guess: F) -> Self
    where
        F: Fn(&Entry) -> Option<f64> + 'a,
    {
        Self {
            label: label.into(),
            miss: Box::new(move |e| guess(e).map(|g| (actual - g).abs())),
        }
    }

    /// 0 for a correct pick, `penalty` otherwise.
    pub fn selection<F>(label: impl Into<String>, penalty: f64, correct: F) -> Self
    where
        F: Fn(&Entry) -> Option<bool> + 'a,
    {
        Self {
            label: label.into(),
            miss: Box::new(move |e| correct(e).map(|ok| if ok { 0.0 } else { penalty })),
        }
    }

    /// Caller-computed miss amount.
    pub fn miss<F>(label: impl Into<String>, miss: F) -> Self
    where
        F: Fn(&Entry) -> Option<f64> + 'a,
    {
        Self { label: label.into(), miss: Box::new(miss) }
    }

    pub fn label(&self) -> &str { &self.label }

    fn miss_for(&self, entry: &Entry) -> Result<f64, ScoreError> {
        let value = (self.miss)(entry).ok_or_else(|| ScoreError::MissingResponse {
            owner: entry.owner().clone(),
            criterion: self.label.clone(),
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(ScoreError::InvalidMissAmount {
                owner: entry.owner().clone(),
                criterion: self.label.clone(),
                value,
            });
        }
        // -0.0 and 0.0 must group together.
        Ok(if value == 0.0 { 0.0 } else { value })
    }
}

impl core::fmt::Debug for Criterion<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Criterion").field("label", &self.label).finish_non_exhaustive()
    }
}

// ----------------------------- Rounds ------------------------------------------------

/// Points for one entry in one round.
#[derive(Clone, Debug, PartialEq)]
pub struct Award {
    pub owner: OwnerId,
    /// Competition rank the points were drawn from.
    pub rank: u32,
    pub points: i64,
    /// Miss-amount tuple, empty for rules that do not use a cascade.
    pub misses: Vec<f64>,
}

/// Immutable result of scoring one question: the award list and a table of
/// owner → points. Fold into a [`Ledger`](crate::Ledger) to accumulate.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    name: String,
    awards: Vec<Award>,
    table: RankedTable,
}

impl Round {
    /// Build from awards; the table's tie-break column shows each award's deciding miss amount.
    pub fn new(name: impl Into<String>, awards: Vec<Award>) -> Self {
        let name = name.into();
        let table = RankedTable::points_table(
            name.clone(),
            awards
                .iter()
                .map(|a| (Subject::from(&a.owner), a.points, a.misses.last().copied())),
        );
        Self { name, awards, table }
    }

    /// Build from plain per-owner totals; ranks follow competition ranking by points.
    pub fn from_points<I>(name: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (OwnerId, i64)>,
    {
        let name = name.into();
        let by_owner: BTreeMap<OwnerId, i64> = points.into_iter().collect();
        let mut ranked: Vec<(&OwnerId, i64)> = by_owner.iter().map(|(o, p)| (o, *p)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut awards = Vec::with_capacity(ranked.len());
        let mut prev: Option<(i64, u32)> = None;
        for (seen, (owner, pts)) in ranked.into_iter().enumerate() {
            let rank = match prev {
                Some((p, r)) if p == pts => r,
                _ => seen as u32 + 1,
            };
            prev = Some((pts, rank));
            awards.push(Award { owner: owner.clone(), rank, points: pts, misses: Vec::new() });
        }
        Self::new(name, awards)
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn awards(&self) -> &[Award] { &self.awards }
    pub fn table(&self) -> &RankedTable { &self.table }

    pub fn points_for(&self, owner: &OwnerId) -> Option<i64> {
        self.awards.iter().find(|a| &a.owner == owner).map(|a| a.points)
    }
}

// ----------------------------- Distance scoring --------------------------------------

/// Rank `entries` by their miss-amount tuples over `criteria` and hand out
/// `schedule` by competition rank. Unmapped ranks score 0.
pub fn score_by_distance(
    name: &str,
    entries: &[Entry],
    criteria: &[Criterion<'_>],
    schedule: &Schedule,
) -> Result<Round, ScoreError> {
    score_refs(name, entries.iter().collect(), criteria, schedule)
}

fn score_refs(
    name: &str,
    entries: Vec<&Entry>,
    criteria: &[Criterion<'_>],
    schedule: &Schedule,
) -> Result<Round, ScoreError> {
    let mut keyed: Vec<(Vec<f64>, &Entry)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let misses = criteria
            .iter()
            .map(|c| c.miss_for(entry))
            .collect::<Result<Vec<f64>, _>>()?;
        keyed.push((misses, entry));
    }
    keyed.sort_by(|a, b| cmp_misses(&a.0, &b.0).then_with(|| a.1.owner().cmp(b.1.owner())));

    let mut awards = Vec::with_capacity(keyed.len());
    let mut rank: u32 = 1;
    let mut groups = 0usize;
    for group in keyed.chunk_by(|a, b| cmp_misses(&a.0, &b.0) == Ordering::Equal) {
        let points = schedule.points_at(rank);
        for (misses, entry) in group {
            awards.push(Award {
                owner: entry.owner().clone(),
                rank,
                points,
                misses: misses.clone(),
            });
        }
        rank += group.len() as u32;
        groups += 1;
    }
    debug!(round = name, entries = awards.len(), groups, criteria = criteria.len(), "distance round scored");
    Ok(Round::new(name, awards))
}

/// Lexicographic, ascending; smaller miss is better.
fn cmp_misses(a: &[f64], b: &[f64]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.total_cmp(y) {
            Ordering::Equal => continue,
            o => return o,
        }
    }
    a.len().cmp(&b.len())
}

// ----------------------------- Positional scoring ------------------------------------

/// Answer key produced by positional scoring.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerKey {
    /// Subject → points if chosen.
    pub points: BTreeMap<Subject, i64>,
    /// Score at the tie-breaker position, when one was requested.
    pub tie_break_target: Option<f64>,
    /// Owner → base award for entries bound to a scheduled position.
    pub base_awards: BTreeMap<OwnerId, i64>,
}

impl AnswerKey {
    pub fn points_for(&self, subject: &Subject) -> Option<i64> { self.points.get(subject).copied() }
}

/// Map outcome positions to points.
///
/// Schedule entries are visited best-points first (ties by position), so a
/// subject whose tie group spans several scheduled positions keeps the best
/// of them. Every scheduled position must exist in the table.
pub fn score_positional(
    table: &RankedTable,
    schedule: &Schedule,
    tie_breaker_pos: Option<u32>,
) -> Result<AnswerKey, TableError> {
    let mut order: Vec<(u32, i64)> = schedule.iter().collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut key = AnswerKey::default();
    for (pos, pts) in order {
        for row in table.rows_at_position(pos)? {
            key.points.entry(row.subject().clone()).or_insert(pts);
            for owner in row.bound() {
                key.base_awards.entry(owner.clone()).or_insert(pts);
            }
        }
    }
    if let Some(tb) = tie_breaker_pos {
        key.tie_break_target = Some(table.score_at_position(tb)?);
    }
    debug!(
        table = %table.name(),
        subjects = key.points.len(),
        awarded = key.base_awards.len(),
        tie_break_target = ?key.tie_break_target,
        "answer key built"
    );
    Ok(key)
}

/// Positional scoring followed by a distance cascade over the bound entries:
/// answer-key points (higher first), then distance of the tie-break guess to
/// the score at `tie_breaker.0`. `award` is handed out by competition rank.
/// Entries not bound to a scheduled position are left out of the round.
pub fn score_positional_cascade<T>(
    name: &str,
    table: &RankedTable,
    entries: &[Entry],
    answer: &Schedule,
    tie_breaker: Option<(u32, T)>,
    award: &Schedule,
) -> Result<(AnswerKey, Round), ScoreError>
where
    T: Fn(&Entry) -> Option<f64>,
{
    let (tb_pos, tb_guess) = match tie_breaker {
        Some((pos, guess)) => (Some(pos), Some(guess)),
        None => (None, None),
    };
    let key = score_positional(table, answer, tb_pos)?;
    let best = key.base_awards.values().copied().max().unwrap_or(0);

    let mut criteria = vec![Criterion::miss("answer", |e: &Entry| {
        // In f64: schedule values span the whole i64 range.
        key.base_awards.get(e.owner()).map(|p| best as f64 - *p as f64)
    })];
    if let (Some(target), Some(guess)) = (key.tie_break_target, tb_guess) {
        criteria.push(Criterion::numeric("tie-breaker", target, guess));
    }

    let scored: Vec<&Entry> = entries
        .iter()
        .filter(|e| key.base_awards.contains_key(e.owner()))
        .collect();
    let round = score_refs(name, scored, &criteria, award)?;
    drop(criteria);
    Ok((key, round))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{bind, bind_with_tie_break};
    use pq_core::{ScoreType, SortDirection};

    fn owner(s: &str) -> OwnerId { s.parse().unwrap() }

    fn sched(pairs: &[(u32, i64)]) -> Schedule { Schedule::new(pairs.iter().copied()).unwrap() }

    fn points(round: &Round) -> Vec<(&str, i64)> {
        round.awards().iter().map(|a| (a.owner.as_str(), a.points)).collect()
    }

    #[test]
    fn ties_share_rank_and_consume_positions() {
        let entries = vec![
            Entry::new(owner("A")).with("n", 4.0),
            Entry::new(owner("B")).with("n", 4.0),
            Entry::new(owner("C")).with("n", 7.0),
        ];
        let criteria = [Criterion::numeric("unique winners", 4.0, |e: &Entry| e.number("n"))];
        let round = score_by_distance("Unique winners", &entries, &criteria, &sched(&[(1, 25), (2, 18), (3, 15)])).unwrap();
        assert_eq!(points(&round), vec![("A", 25), ("B", 25), ("C", 15)]);
        assert_eq!(round.awards()[2].rank, 3);
        assert_eq!(round.awards()[2].misses, vec![3.0]);
    }

    #[test]
    fn cascade_breaks_ties_on_second_criterion() {
        let entries = vec![
            Entry::new(owner("A")).with("lead", 2.0).with("second", 5.0),
            Entry::new(owner("B")).with("lead", 2.0).with("second", 9.0),
            Entry::new(owner("C")).with("lead", 1.0).with("second", 0.0),
        ];
        let criteria = [
            Criterion::numeric("leader", 2.0, |e: &Entry| e.number("lead")),
            Criterion::numeric("second", 6.0, |e: &Entry| e.number("second")),
        ];
        let round = score_by_distance("Leader", &entries, &criteria, &Schedule::f1()).unwrap();
        assert_eq!(points(&round), vec![("A", 25), ("B", 18), ("C", 15)]);
    }

    #[test]
    fn selection_penalty_then_unmapped_rank_scores_zero() {
        let entries = vec![
            Entry::new(owner("A")).with("pick", "Latifi"),
            Entry::new(owner("B")).with("pick", "Mazepin"),
        ];
        let criteria = [Criterion::selection("first out", 1.0, |e: &Entry| {
            e.guess("pick").map(|g| g.contains(&"Latifi".into()))
        })];
        let round = score_by_distance("First out", &entries, &criteria, &sched(&[(1, 10)])).unwrap();
        assert_eq!(points(&round), vec![("A", 10), ("B", 0)]);
    }

    #[test]
    fn missing_numeric_response_is_surfaced() {
        let entries = vec![Entry::new(owner("A")).with("n", "seven")];
        let criteria = [Criterion::numeric("count", 7.0, |e: &Entry| e.number("n"))];
        let err = score_by_distance("Count", &entries, &criteria, &Schedule::f1()).unwrap_err();
        assert_eq!(err, ScoreError::MissingResponse { owner: owner("A"), criterion: "count".into() });
    }

    #[test]
    fn negative_miss_is_rejected() {
        let entries = vec![Entry::new(owner("A"))];
        let criteria = [Criterion::miss("broken", |_: &Entry| Some(-1.0))];
        assert!(matches!(
            score_by_distance("Broken", &entries, &criteria, &Schedule::f1()),
            Err(ScoreError::InvalidMissAmount { .. })
        ));
    }

    #[test]
    fn negative_schedule_passes_through() {
        let entries = vec![Entry::new(owner("A")), Entry::new(owner("B"))];
        let round = score_by_distance("Penalty", &entries, &[], &sched(&[(1, -5)])).unwrap();
        assert_eq!(points(&round), vec![("A", -5), ("B", -5)]);
    }

    fn teams() -> RankedTable {
        let mut t = RankedTable::new("Teams", "Team", "Points", ScoreType::Int, SortDirection::Descending);
        for (pts, name) in [(100, "Mercedes"), (90, "Ferrari"), (90, "McLaren"), (80, "Alpine"), (70, "Haas")] {
            t.add_subject(pts, name).unwrap();
        }
        t
    }

    #[test]
    fn tied_teams_share_the_answer_key_value() {
        let mut t = teams();
        let entries = vec![
            Entry::new(owner("A")).with("q", "Ferrari"),
            Entry::new(owner("B")).with("q", "McLaren"),
            Entry::new(owner("C")).with("q", "Haas"),
        ];
        bind(&mut t, &entries, "q", |e| e.guess("q")).unwrap();
        let key = score_positional(&t, &sched(&[(1, 25), (2, 18), (3, 18), (4, 12)]), None).unwrap();

        assert_eq!(key.points_for(&"Ferrari".into()), Some(18));
        assert_eq!(key.points_for(&"McLaren".into()), Some(18));
        assert_eq!(key.points_for(&"Alpine".into()), Some(12));
        assert_eq!(key.points_for(&"Haas".into()), None);
        assert_eq!(key.base_awards.get(&owner("A")), Some(&18));
        assert_eq!(key.base_awards.get(&owner("B")), Some(&18));
        assert!(!key.base_awards.contains_key(&owner("C")));
        assert_eq!(key.tie_break_target, None);
    }

    #[test]
    fn best_scheduled_position_wins_inside_a_tie() {
        let t = teams();
        // Ferrari and McLaren occupy positions 2 and 3.
        let key = score_positional(&t, &sched(&[(2, 12), (3, 25)]), Some(3)).unwrap();
        assert_eq!(key.points_for(&"Ferrari".into()), Some(25));
        assert_eq!(key.tie_break_target, Some(90.0));
    }

    #[test]
    fn schedule_beyond_table_is_out_of_range() {
        let t = teams();
        assert_eq!(
            score_positional(&t, &sched(&[(6, 1)]), None),
            Err(TableError::PositionOutOfRange { pos: 6, rows: 5 })
        );
    }

    #[test]
    fn positional_cascade_orders_by_answer_then_tie_break() {
        let mut t = teams();
        let entries = vec![
            Entry::new(owner("A")).with("q", "Alpine").with("tb", 70.0),
            Entry::new(owner("B")).with("q", "Alpine").with("tb", 81.0),
            Entry::new(owner("C")).with("q", "Ferrari").with("tb", 80.0),
            Entry::new(owner("D")).with("q", "Haas").with("tb", 80.0),
            Entry::new(owner("E")).with("q", "Williams").with("tb", 80.0),
        ];
        bind_with_tie_break(&mut t, &entries, "q", |e| e.guess("q"), |e| e.number("tb")).unwrap();

        let answer = sched(&[(4, 25), (3, 18), (5, 18), (2, 15), (1, 10)]);
        let (key, round) = score_positional_cascade(
            "Team fourth",
            &t,
            &entries,
            &answer,
            Some((4, |e: &Entry| e.number("tb"))),
            &Schedule::f1(),
        )
        .unwrap();

        assert_eq!(key.tie_break_target, Some(80.0));
        // B is 1 off the target, A is 10 off; C (Ferrari, 18) and D (Haas, 18) tie exactly.
        assert_eq!(points(&round), vec![("B", 25), ("A", 18), ("C", 15), ("D", 15)]);
        assert_eq!(round.points_for(&owner("E")), None);
    }

    #[test]
    fn extreme_answer_schedule_orders_without_overflow() {
        let mut t = RankedTable::new("Pair", "Team", "Points", ScoreType::Int, SortDirection::Descending);
        t.add_subject(2, "Top").unwrap();
        t.add_subject(1, "Bottom").unwrap();
        let entries = vec![
            Entry::new(owner("A")).with("q", "Bottom"),
            Entry::new(owner("B")).with("q", "Top"),
        ];
        bind(&mut t, &entries, "q", |e| e.guess("q")).unwrap();

        let answer = sched(&[(1, i64::MAX), (2, i64::MIN)]);
        let (_, round) = score_positional_cascade(
            "Extremes",
            &t,
            &entries,
            &answer,
            None::<(u32, fn(&Entry) -> Option<f64>)>,
            &sched(&[(1, 10), (2, 5)]),
        )
        .unwrap();
        assert_eq!(points(&round), vec![("B", 10), ("A", 5)]);
    }

    #[test]
    fn round_table_carries_the_deciding_miss() {
        let round = Round::new(
            "Closest",
            vec![Award { owner: owner("A"), rank: 1, points: 25, misses: vec![0.0, 2.5] }],
        );
        let row = &round.table().ranked_rows()[0];
        assert_eq!(row.tie_break_value(), Some(2.5));
        assert_eq!(row.score(), &pq_core::Score::Int(25));
    }

    #[test]
    fn round_from_points_uses_competition_ranks() {
        let round = Round::from_points(
            "Bingo",
            [(owner("A"), 5), (owner("B"), 9), (owner("C"), 5), (owner("D"), -3)],
        );
        let ranks: Vec<(&str, u32)> = round.awards().iter().map(|a| (a.owner.as_str(), a.rank)).collect();
        assert_eq!(ranks, vec![("B", 1), ("A", 2), ("C", 2), ("D", 4)]);
        assert_eq!(round.table().position_of(&"C".into()), Some(2));
    }
}
