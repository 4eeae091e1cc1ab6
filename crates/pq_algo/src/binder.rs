//! Attach entries to the table rows their guesses name.
//!
//! Scalar guesses bind to the first row (ranked order) whose subject matches;
//! multi-pick guesses bind to every matching row. A guess naming no row leaves
//! the entry unbound, which is not an error. A missing response is.

use pq_core::OwnerId;
use tracing::debug;

use crate::prediction::{Entry, Guess};
use crate::table::RankedTable;
use crate::ScoreError;

/// Who ended up attached to at least one row, and who did not.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindReport {
    pub bound: Vec<OwnerId>,
    pub unbound: Vec<OwnerId>,
}

/// Bind every entry's guess (read by `guess`) to `table`. `field` names the
/// response in errors.
pub fn bind<G>(
    table: &mut RankedTable,
    entries: &[Entry],
    field: &str,
    guess: G,
) -> Result<BindReport, ScoreError>
where
    G: Fn(&Entry) -> Option<&Guess>,
{
    bind_inner(table, entries, field, guess, None)
}

/// As [`bind`], additionally requiring every bound entry to carry a numeric
/// tie-break guess.
pub fn bind_with_tie_break<G, T>(
    table: &mut RankedTable,
    entries: &[Entry],
    field: &str,
    guess: G,
    tie_break: T,
) -> Result<BindReport, ScoreError>
where
    G: Fn(&Entry) -> Option<&Guess>,
    T: Fn(&Entry) -> Option<f64>,
{
    bind_inner(table, entries, field, guess, Some(&tie_break as &dyn Fn(&Entry) -> Option<f64>))
}

fn bind_inner<G>(
    table: &mut RankedTable,
    entries: &[Entry],
    field: &str,
    guess: G,
    tie_break: Option<&dyn Fn(&Entry) -> Option<f64>>,
) -> Result<BindReport, ScoreError>
where
    G: Fn(&Entry) -> Option<&Guess>,
{
    // Resolve everything before touching the table so a failure leaves it unchanged.
    let mut plan: Vec<(usize, &OwnerId)> = Vec::new();
    let mut report = BindReport::default();
    for entry in entries {
        let g = guess(entry).ok_or_else(|| missing(entry, field))?;
        let rows = matching_rows(table, g);
        if rows.is_empty() {
            report.unbound.push(entry.owner().clone());
            continue;
        }
        if let Some(tb) = tie_break {
            if tb(entry).is_none() {
                return Err(missing(entry, &format!("{field} tie-breaker")));
            }
        }
        plan.extend(rows.into_iter().map(|i| (i, entry.owner())));
        report.bound.push(entry.owner().clone());
    }

    let rows = table.rows_mut();
    for (idx, owner) in plan {
        rows[idx].bind_owner(owner);
    }
    debug!(
        table = %table.name(),
        field,
        bound = report.bound.len(),
        unbound = report.unbound.len(),
        "entries bound"
    );
    Ok(report)
}

/// Row indices a guess attaches to, in ranked order.
fn matching_rows(table: &RankedTable, guess: &Guess) -> Vec<usize> {
    let rows = table.ranked_rows();
    match guess {
        Guess::Scalar(s) => rows.iter().position(|r| r.subject() == s).into_iter().collect(),
        Guess::MultiPick(picks) => rows
            .iter()
            .enumerate()
            .filter(|(_, r)| picks.contains(r.subject()))
            .map(|(i, _)| i)
            .collect(),
    }
}

fn missing(entry: &Entry, criterion: &str) -> ScoreError {
    ScoreError::MissingResponse {
        owner: entry.owner().clone(),
        criterion: criterion.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pq_core::{ScoreType, SortDirection};

    fn owner(s: &str) -> OwnerId { s.parse().unwrap() }

    fn drivers() -> RankedTable {
        let mut t = RankedTable::new("Drivers", "Driver", "Points", ScoreType::Int, SortDirection::Descending);
        for (pts, name) in [(50, "Hamilton"), (40, "Verstappen"), (40, "Bottas"), (10, "Norris")] {
            t.add_subject(pts, name).unwrap();
        }
        t
    }

    fn bound_at(t: &RankedTable, subject: &str) -> Vec<String> {
        let pos = t.position_of(&subject.into()).unwrap();
        t.rows_at_position(pos)
            .unwrap()
            .iter()
            .filter(|r| r.subject().as_str() == subject)
            .flat_map(|r| r.bound().iter().map(|o| o.to_string()))
            .collect()
    }

    #[test]
    fn scalar_and_multi_pick_binding() {
        let mut t = drivers();
        let entries = vec![
            Entry::new(owner("Alice")).with("q", "Bottas"),
            Entry::new(owner("Bob")).with("q", vec!["Hamilton", "Norris", "Leclerc"]),
            Entry::new(owner("Cara")).with("q", "Leclerc"),
        ];
        let report = bind(&mut t, &entries, "q", |e| e.guess("q")).unwrap();

        assert_eq!(report.bound, vec![owner("Alice"), owner("Bob")]);
        assert_eq!(report.unbound, vec![owner("Cara")]);
        assert_eq!(bound_at(&t, "Bottas"), vec!["Alice"]);
        assert_eq!(bound_at(&t, "Hamilton"), vec!["Bob"]);
        assert_eq!(bound_at(&t, "Norris"), vec!["Bob"]);
        assert!(bound_at(&t, "Verstappen").is_empty());
    }

    #[test]
    fn rebinding_does_not_duplicate_owners() {
        let mut t = drivers();
        let entries = vec![Entry::new(owner("Alice")).with("q", "Norris")];
        bind(&mut t, &entries, "q", |e| e.guess("q")).unwrap();
        bind(&mut t, &entries, "q", |e| e.guess("q")).unwrap();
        assert_eq!(bound_at(&t, "Norris"), vec!["Alice"]);
    }

    #[test]
    fn missing_guess_is_an_error_and_leaves_table_untouched() {
        let mut t = drivers();
        let entries = vec![
            Entry::new(owner("Alice")).with("q", "Norris"),
            Entry::new(owner("Bob")),
        ];
        let err = bind(&mut t, &entries, "q", |e| e.guess("q")).unwrap_err();
        assert_eq!(
            err,
            ScoreError::MissingResponse { owner: owner("Bob"), criterion: "q".into() }
        );
        assert!(t.ranked_rows().iter().all(|r| r.bound().is_empty()));
    }

    #[test]
    fn tie_break_required_for_bound_entries_only() {
        let mut t = drivers();
        let entries = vec![
            Entry::new(owner("Alice")).with("q", "Norris").with("tb", 12.0),
            Entry::new(owner("Cara")).with("q", "Leclerc"),
        ];
        let report =
            bind_with_tie_break(&mut t, &entries, "q", |e| e.guess("q"), |e| e.number("tb")).unwrap();
        assert_eq!(report.bound.len(), 1);

        let mut t = drivers();
        let entries = vec![Entry::new(owner("Bob")).with("q", "Norris")];
        let err = bind_with_tie_break(&mut t, &entries, "q", |e| e.guess("q"), |e| e.number("tb"))
            .unwrap_err();
        assert_eq!(
            err,
            ScoreError::MissingResponse { owner: owner("Bob"), criterion: "q tie-breaker".into() }
        );
    }
}
