//! Loader: read a local contest JSON file, deserialize it into typed documents
//! and run structural checks (unique ids, resolvable references) before any
//! question is scored. No network I/O.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::contest::{Contest, QuestionKind};
use crate::IoError;

/// Hard cap on contest file size (bytes).
const MAX_CONTEST_BYTES: u64 = 16 * 1024 * 1024;

/// Read, parse and validate a contest file.
pub fn load_contest(path: &Path) -> Result<Contest, IoError> {
    let meta = fs::metadata(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    if meta.len() > MAX_CONTEST_BYTES {
        return Err(IoError::Invalid(format!(
            "{}: contest file is {} bytes (limit {MAX_CONTEST_BYTES})",
            path.display(),
            meta.len()
        )));
    }
    let text = fs::read_to_string(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let contest = parse_contest(&text)?;
    info!(
        path = %path.display(),
        contest = %contest.name,
        tables = contest.tables.len(),
        entries = contest.entries.len(),
        questions = contest.questions.len(),
        "contest loaded"
    );
    Ok(contest)
}

/// Parse and validate contest JSON held in memory.
pub fn parse_contest(text: &str) -> Result<Contest, IoError> {
    let contest: Contest = serde_json::from_str(text)?;
    validate_contest(&contest)?;
    Ok(contest)
}

/// Cross-reference checks. Scoring-time problems (score types, missing
/// responses) are left to the pipeline so they only fail their own question.
pub fn validate_contest(c: &Contest) -> Result<(), IoError> {
    if c.entries.is_empty() {
        return Err(IoError::Invalid("contest has no entries".into()));
    }

    let mut owners = BTreeSet::new();
    for e in &c.entries {
        if !owners.insert(&e.owner) {
            return Err(IoError::Invalid(format!("duplicate entry owner {:?}", e.owner.as_str())));
        }
    }

    let mut tables = BTreeSet::new();
    for t in &c.tables {
        if !tables.insert(t.name.as_str()) {
            return Err(IoError::Invalid(format!("duplicate table {:?}", t.name)));
        }
        let mut subjects = BTreeSet::new();
        for row in &t.rows {
            if !subjects.insert(&row.subject) {
                return Err(IoError::Invalid(format!(
                    "table {:?}: duplicate subject {:?}",
                    t.name,
                    row.subject.as_str()
                )));
            }
        }
    }

    let mut ids = BTreeSet::new();
    for q in &c.questions {
        // Ids name archive files.
        if q.id.trim().is_empty() || q.id.contains(['/', '\\']) || q.id.starts_with('.') {
            return Err(IoError::Invalid(format!("question id {:?} is not a plain name", q.id)));
        }
        if q.id == "standings" {
            return Err(IoError::Invalid("question id \"standings\" is reserved".into()));
        }
        if !ids.insert(q.id.as_str()) {
            return Err(IoError::Invalid(format!("duplicate question id {:?}", q.id)));
        }
        if let Some(name) = q.kind.table() {
            if !tables.contains(name) {
                return Err(IoError::Invalid(format!("question {:?}: unknown table {name:?}", q.id)));
            }
        }
        for r in q.kind.schedules() {
            c.schedule(r)
                .map_err(|e| IoError::Invalid(format!("question {:?}: {e}", q.id)))?;
        }
        match &q.kind {
            QuestionKind::Closest { criteria, .. } if criteria.is_empty() => {
                return Err(IoError::Invalid(format!("question {:?}: closest needs at least one criterion", q.id)));
            }
            QuestionKind::Placement { matrix, .. } if matrix.is_empty() => {
                return Err(IoError::Invalid(format!("question {:?}: empty placement matrix", q.id)));
            }
            QuestionKind::Positional { tie_breaker: Some(tb), .. } if tb.position == 0 => {
                return Err(IoError::Invalid(format!("question {:?}: tie-breaker position must be >= 1", q.id)));
            }
            _ => {}
        }
        debug!(question = %q.id, kind = q.kind.name(), "question validated");
    }
    Ok(())
}
