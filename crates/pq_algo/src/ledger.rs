//! Per-owner running totals across scoring rounds.
//!
//! Rounds never mutate entries; the ledger is the only place points accumulate.
//! Applying the same round twice counts it twice.

use std::collections::BTreeMap;

use pq_core::{OwnerId, Subject};
use tracing::{debug, warn};

use crate::scorer::Round;
use crate::table::RankedTable;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    totals: BTreeMap<OwnerId, i64>,
    applied: Vec<String>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    /// Ledger that lists every owner, even those who never score.
    pub fn with_owners<'a, I: IntoIterator<Item = &'a OwnerId>>(owners: I) -> Self {
        Self {
            totals: owners.into_iter().map(|o| (o.clone(), 0)).collect(),
            applied: Vec::new(),
        }
    }

    /// Add every award in `round` to its owner's total.
    pub fn apply(&mut self, round: &Round) {
        if self.applied.iter().any(|n| n == round.name()) {
            warn!(round = round.name(), "round applied more than once; totals will double count");
        }
        for award in round.awards() {
            let total = self.totals.entry(award.owner.clone()).or_insert(0);
            *total = total.saturating_add(award.points);
        }
        self.applied.push(round.name().to_string());
        debug!(round = round.name(), awards = round.awards().len(), "round applied");
    }

    pub fn total(&self, owner: &OwnerId) -> i64 { self.totals.get(owner).copied().unwrap_or(0) }

    pub fn totals(&self) -> &BTreeMap<OwnerId, i64> { &self.totals }

    /// Names of applied rounds, in order.
    pub fn rounds(&self) -> &[String] { &self.applied }

    /// Overall standings, highest total first.
    pub fn standings(&self, name: &str) -> RankedTable {
        RankedTable::points_table(name, self.totals.iter().map(|(o, p)| (Subject::from(o), *p, None)))
    }
}
