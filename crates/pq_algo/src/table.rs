//! Tie-aware ranked table (competition ranking: 1, 1, 3, 4, 4, 4, 7, ...).
//!
//! Rows are kept in ranked order at all times: descending or ascending by
//! score, then ascending by subject so exact ties iterate reproducibly.
//! Positions are reassigned in one pass after every insertion.

use core::cmp::Ordering;
use core::fmt;

use pq_core::{OwnerId, Score, ScoreType, SortDirection, Subject};
use tracing::trace;

use crate::TableError;

/// Display metadata and ranking configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMeta {
    pub name: String,
    pub subject_label: String,
    pub score_label: String,
    pub score_type: ScoreType,
    pub direction: SortDirection,
}

/// One ranked subject.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredRow {
    subject: Subject,
    score: Score,
    position: u32,
    tie_break_value: Option<f64>,
    bound: Vec<OwnerId>,
}

impl ScoredRow {
    pub fn subject(&self) -> &Subject { &self.subject }
    pub fn score(&self) -> &Score { &self.score }
    /// Competition-rank position (1-based).
    pub fn position(&self) -> u32 { self.position }
    pub fn tie_break_value(&self) -> Option<f64> { self.tie_break_value }
    /// Owners whose guess matched this row, in binding order.
    pub fn bound(&self) -> &[OwnerId] { &self.bound }

    /// Append-only; returns false when the owner was already bound here.
    pub(crate) fn bind_owner(&mut self, owner: &OwnerId) -> bool {
        if self.bound.contains(owner) {
            return false;
        }
        self.bound.push(owner.clone());
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedTable {
    meta: TableMeta,
    rows: Vec<ScoredRow>,
}

impl RankedTable {
    pub fn new(
        name: impl Into<String>,
        subject_label: impl Into<String>,
        score_label: impl Into<String>,
        score_type: ScoreType,
        direction: SortDirection,
    ) -> Self {
        Self {
            meta: TableMeta {
                name: name.into(),
                subject_label: subject_label.into(),
                score_label: score_label.into(),
                score_type,
                direction,
            },
            rows: Vec::new(),
        }
    }

    pub fn meta(&self) -> &TableMeta { &self.meta }
    pub fn name(&self) -> &str { &self.meta.name }
    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Add a subject with its score. The score type must match the table's declared type.
    pub fn add_subject(
        &mut self,
        score: impl Into<Score>,
        subject: impl Into<Subject>,
    ) -> Result<&mut ScoredRow, TableError> {
        let score = score.into();
        if score.score_type() != self.meta.score_type {
            return Err(TableError::InvalidScoreType {
                table: self.meta.name.clone(),
                expected: self.meta.score_type,
                got: score.score_type(),
            });
        }
        Ok(self.insert_row(score, subject.into()))
    }

    /// Owner → points table (ints, highest first) with an optional tie-break
    /// column. Always homogeneous, so it skips the score type check.
    pub(crate) fn points_table<I>(name: impl Into<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = (Subject, i64, Option<f64>)>,
    {
        let mut table = Self::new(name, "Entry", "Points", ScoreType::Int, SortDirection::Descending);
        for (subject, pts, tie_break) in rows {
            table.insert_row(Score::Int(pts), subject).tie_break_value = tie_break;
        }
        table
    }

    fn insert_row(&mut self, score: Score, subject: Subject) -> &mut ScoredRow {
        let row = ScoredRow {
            subject,
            score,
            position: 0,
            tie_break_value: None,
            bound: Vec::new(),
        };

        // Insert after anything that sorts before or equal, so duplicates keep insertion order.
        let dir = self.meta.direction;
        let idx = self
            .rows
            .partition_point(|r| cmp_rows(dir, r, &row) != Ordering::Greater);
        self.rows.insert(idx, row);
        self.assign_positions();
        &mut self.rows[idx]
    }

    /// Single pass over ranked rows tracking (last distinct score, its position, rows seen).
    fn assign_positions(&mut self) {
        let mut last: Option<(Score, u32)> = None;
        for (seen, row) in self.rows.iter_mut().enumerate() {
            let pos = match &last {
                Some((score, pos)) if *score == row.score => *pos,
                _ => seen as u32 + 1,
            };
            row.position = pos;
            last = Some((row.score.clone(), pos));
        }
        trace!(table = %self.meta.name, rows = self.rows.len(), "positions assigned");
    }

    /// Rows in ranked order with positions assigned. Stable across calls.
    pub fn ranked_rows(&self) -> &[ScoredRow] { &self.rows }

    pub(crate) fn rows_mut(&mut self) -> &mut [ScoredRow] { &mut self.rows }

    /// Tie groups in ranked order; every row belongs to exactly one group.
    pub fn groups(&self) -> Vec<&[ScoredRow]> {
        self.rows.chunk_by(|a, b| a.position == b.position).collect()
    }

    /// All rows tied at `pos`.
    ///
    /// A tie at position p consumes positions p..p+n-1; asking for any of them
    /// returns the same group. Positions are valid from 1 through the row count.
    pub fn rows_at_position(&self, pos: u32) -> Result<&[ScoredRow], TableError> {
        self.check_pos(pos)?;
        let start = self.rows.partition_point(|r| r.position <= pos);
        // rows[start - 1] is the last row whose group starts at or before `pos`.
        let group_pos = self.rows[start - 1].position;
        let first = self.rows.partition_point(|r| r.position < group_pos);
        Ok(&self.rows[first..start])
    }

    /// The row at absolute index `pos - 1`, ignoring tie grouping.
    pub fn row_at(&self, pos: u32) -> Result<&ScoredRow, TableError> {
        self.check_pos(pos)?;
        Ok(&self.rows[pos as usize - 1])
    }

    fn check_pos(&self, pos: u32) -> Result<(), TableError> {
        if pos == 0 || pos as usize > self.rows.len() {
            return Err(TableError::PositionOutOfRange { pos, rows: self.rows.len() });
        }
        Ok(())
    }

    /// Competition-rank position of `subject`, `None` when absent.
    pub fn position_of(&self, subject: &Subject) -> Option<u32> {
        self.rows
            .iter()
            .find(|r| &r.subject == subject)
            .map(|r| r.position)
    }

    /// Like [`position_of`](Self::position_of) but absent subjects are an error.
    pub fn require_position(&self, subject: &Subject) -> Result<u32, TableError> {
        self.position_of(subject)
            .ok_or_else(|| TableError::SubjectNotFound(subject.clone()))
    }

    /// Numeric score of the first row tied at `pos`.
    pub fn score_at_position(&self, pos: u32) -> Result<f64, TableError> {
        let rows = self.rows_at_position(pos)?;
        rows[0]
            .score
            .as_f64()
            .ok_or(TableError::NonNumericScore { pos })
    }
}

/// Ranked order: score per direction, then subject ascending.
fn cmp_rows(dir: SortDirection, a: &ScoredRow, b: &ScoredRow) -> Ordering {
    match dir.apply(a.score.cmp(&b.score)) {
        Ordering::Equal => a.subject.cmp(&b.subject),
        o => o,
    }
}

impl fmt::Display for RankedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scores: Vec<String> = self
            .rows
            .iter()
            .map(|r| match r.score {
                Score::Float(v) => format!("{v:.3}"),
                ref s => s.to_string(),
            })
            .collect();
        let sw = self
            .rows
            .iter()
            .map(|r| r.subject.as_str().chars().count())
            .chain([self.meta.subject_label.chars().count()])
            .max()
            .unwrap_or(0);
        let cw = scores
            .iter()
            .map(|s| s.chars().count())
            .chain([self.meta.score_label.chars().count()])
            .max()
            .unwrap_or(0);
        let show_bound = self.rows.iter().any(|r| !r.bound.is_empty());

        writeln!(f, "{}", self.meta.name)?;
        write!(f, "{:>3} {:<sw$} {:>cw$}", "Pos", self.meta.subject_label, self.meta.score_label)?;
        if show_bound {
            write!(f, "  Picked by")?;
        }
        let mut prev: Option<u32> = None;
        for (row, score) in self.rows.iter().zip(&scores) {
            writeln!(f)?;
            let pos = if prev == Some(row.position) { String::new() } else { row.position.to_string() };
            write!(f, "{:>3} {:<sw$} {:>cw$}", pos, row.subject, score)?;
            if show_bound && !row.bound.is_empty() {
                let owners: Vec<&str> = row.bound.iter().map(|o| o.as_str()).collect();
                write!(f, "  {}", owners.join(", "))?;
            }
            prev = Some(row.position);
        }
        Ok(())
    }
}
