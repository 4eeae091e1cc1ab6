// crates/pq_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Ranking and scoring primitives shared by every contest question.
//!
//! Flow: build a [`RankedTable`] of real-world outcomes, attach entries to it
//! with [`binder::bind`], turn closeness into points with the [`scorer`], and
//! fold the resulting [`Round`]s into a [`Ledger`].

use pq_core::{OwnerId, ScoreType, Subject};
use thiserror::Error;

// Core IDs and value types
pub use pq_core::{Schedule, Score, SortDirection};

// ----------------------------- Errors ------------------------------------------------

/// Failures raised by table construction and positional queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// A row's score type disagrees with the table's declared type.
    #[error("table {table:?} declares {expected} scores, got {got}")]
    InvalidScoreType {
        table: String,
        expected: ScoreType,
        got: ScoreType,
    },
    /// Positional query beyond the row count (or position 0).
    #[error("position {pos} out of range for table with {rows} rows")]
    PositionOutOfRange { pos: u32, rows: usize },
    /// Strict lookup of a subject that is not in the table.
    #[error("subject {0:?} not found")]
    SubjectNotFound(Subject),
    /// Tie-break targets need a numeric score.
    #[error("score at position {pos} is not numeric")]
    NonNumericScore { pos: u32 },
}

/// Failures raised while binding or scoring entries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// An entry lacks the response a criterion needs.
    #[error("{owner}: missing response for {criterion}")]
    MissingResponse { owner: OwnerId, criterion: String },
    /// A miss amount was negative or not finite.
    #[error("{owner}: invalid miss amount {value} for {criterion}")]
    InvalidMissAmount {
        owner: OwnerId,
        criterion: String,
        value: f64,
    },
    #[error(transparent)]
    Table(#[from] TableError),
}

// ----------------------------- Modules -----------------------------------------------

pub mod table;
pub mod prediction;
pub mod binder;
pub mod scorer;
pub mod ledger;

#[cfg(feature = "rules")]
pub mod rules;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use binder::{bind, bind_with_tie_break, BindReport};
pub use ledger::Ledger;
pub use prediction::{Entry, Guess, Response};
pub use scorer::{
    score_by_distance, score_positional, score_positional_cascade, AnswerKey, Award, Criterion,
    Round,
};
pub use table::{RankedTable, ScoredRow, TableMeta};
