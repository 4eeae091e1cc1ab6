//! pq_pipeline: run a whole contest (load → score each question → ledger → standings → archive).
//!
//! Questions run in file order. A question that cannot be scored yet is
//! `Pending`; one with malformed input is `Failed`. Neither stops the questions
//! after it. Each scored round is applied to the ledger exactly once.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use pq_algo::{Ledger, RankedTable, Round};
use pq_io::archive::{round_value, standings_value, write_archive};
use pq_io::{Contest, IoError};
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;
use tracing::{info, warn};

mod questions;

pub use questions::{points_by_owner, Unscored};

/// Errors that stop a whole run (per-question problems never do).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Where a question ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionStatus {
    Scored,
    /// Outcome not determined yet; reason attached.
    Pending(String),
    /// Malformed input for this question; reason attached.
    Failed(String),
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Scored => "scored",
            QuestionStatus::Pending(_) => "pending",
            QuestionStatus::Failed(_) => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            QuestionStatus::Scored => None,
            QuestionStatus::Pending(r) | QuestionStatus::Failed(r) => Some(r),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionOutcome {
    pub id: String,
    pub title: String,
    pub status: QuestionStatus,
    /// Present iff `status` is `Scored`.
    pub round: Option<Round>,
}

#[derive(Debug, Clone)]
pub struct ContestOutcome {
    pub name: String,
    pub questions: Vec<QuestionOutcome>,
    pub ledger: Ledger,
    pub standings: RankedTable,
}

impl ContestOutcome {
    pub fn failed(&self) -> impl Iterator<Item = &QuestionOutcome> {
        self.questions.iter().filter(|q| matches!(q.status, QuestionStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool { self.failed().next().is_some() }

    pub fn scored_rounds(&self) -> impl Iterator<Item = &Round> {
        self.questions.iter().filter_map(|q| q.round.as_ref())
    }
}

/// Score every question of an already loaded contest.
pub fn run_contest(contest: &Contest) -> ContestOutcome {
    let entries = contest.to_entries();
    let mut ledger = Ledger::with_owners(entries.iter().map(|e| e.owner()));
    let mut outcomes = Vec::with_capacity(contest.questions.len());

    for q in &contest.questions {
        let (status, round) = match questions::score_question(contest, &entries, q) {
            Ok(round) => {
                ledger.apply(&round);
                info!(question = %q.id, kind = q.kind.name(), awards = round.awards().len(), "question scored");
                (QuestionStatus::Scored, Some(round))
            }
            Err(Unscored::Pending(reason)) => {
                info!(question = %q.id, %reason, "question pending");
                (QuestionStatus::Pending(reason), None)
            }
            Err(Unscored::Failed(reason)) => {
                warn!(question = %q.id, %reason, "question failed");
                (QuestionStatus::Failed(reason), None)
            }
        };
        outcomes.push(QuestionOutcome {
            id: q.id.clone(),
            title: q.title().to_string(),
            status,
            round,
        });
    }

    let standings = ledger.standings(&contest.name);
    ContestOutcome {
        name: contest.name.clone(),
        questions: outcomes,
        ledger,
        standings,
    }
}

/// Load a contest file and run it.
pub fn run_contest_file(path: &Path) -> Result<ContestOutcome, PipelineError> {
    let contest = pq_io::load_contest(path)?;
    Ok(run_contest(&contest))
}

/// Write `standings.json` plus one `<question-id>.json` per question into `dir`.
/// Unscored questions get a status-only document.
pub fn archive_outcome(outcome: &ContestOutcome, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut written = Vec::with_capacity(outcome.questions.len() + 1);

    let mut standings = JsonMap::new();
    standings.insert("contest".into(), Value::String(outcome.name.clone()));
    standings.insert("rounds".into(), Value::from(outcome.ledger.rounds().to_vec()));
    standings.insert("standings".into(), standings_value(&outcome.standings));
    write_archive(dir, "standings", &Value::Object(standings))?;
    written.push(dir.join("standings.json"));

    for q in &outcome.questions {
        let mut doc = JsonMap::new();
        doc.insert("id".into(), Value::String(q.id.clone()));
        doc.insert("title".into(), Value::String(q.title.clone()));
        doc.insert("status".into(), Value::String(q.status.as_str().into()));
        if let Some(reason) = q.status.reason() {
            doc.insert("reason".into(), Value::String(reason.into()));
        }
        if let Some(round) = &q.round {
            doc.insert("round".into(), round_value(round));
        }
        write_archive(dir, &q.id, &Value::Object(doc))?;
        written.push(dir.join(format!("{}.json", q.id)));
    }
    info!(dir = %dir.display(), files = written.len(), "results archived");
    Ok(written)
}
