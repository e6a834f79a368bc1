use std::collections::{BTreeMap, BTreeSet};

use super::super::domain::{CareerEntry, Competence};

/// Mutable credit state threaded through the four tier passes of one computation.
///
/// Once every pass has finished a competence month lives in at most one of the credit
/// collections (`months_at_top`, `tier30`, `tier20`, `tier10`).
#[derive(Debug, Default)]
pub struct CreditAccumulator {
    pub(crate) months_at_top: BTreeSet<Competence>,
    pub(crate) tier30: BTreeMap<Competence, u32>,
    pub(crate) tier20: BTreeMap<Competence, u32>,
    pub(crate) tier10: BTreeMap<Competence, u32>,
    pub(crate) accepted: Vec<CareerEntry>,
    pub(crate) pending_tier10: BTreeMap<Competence, Vec<CareerEntry>>,
    pub(crate) promoted_tier10: BTreeMap<Competence, Vec<CareerEntry>>,
    qualified_facilities: BTreeSet<String>,
}

impl CreditAccumulator {
    pub fn new(qualified_facilities: BTreeSet<String>) -> Self {
        Self {
            qualified_facilities,
            ..Self::default()
        }
    }

    pub fn qualified_facilities(&self) -> &BTreeSet<String> {
        &self.qualified_facilities
    }

    pub fn months_at_top(&self) -> &BTreeSet<Competence> {
        &self.months_at_top
    }

    pub fn tier30_counts(&self) -> &BTreeMap<Competence, u32> {
        &self.tier30
    }

    pub fn tier20_counts(&self) -> &BTreeMap<Competence, u32> {
        &self.tier20
    }

    pub fn tier10_counts(&self) -> &BTreeMap<Competence, u32> {
        &self.tier10
    }

    pub fn accepted_rows(&self) -> &[CareerEntry] {
        &self.accepted
    }

    pub fn is_at_top(&self, competence: &Competence) -> bool {
        self.months_at_top.contains(competence)
    }

    pub(crate) fn promote_to_top(&mut self, competence: Competence) {
        self.months_at_top.insert(competence);
    }

    pub(crate) fn accept_row(&mut self, entry: &CareerEntry) {
        self.accepted.push(entry.clone());
    }

    /// Moves every buffered Tier-10 row for the month into the accepted history.
    pub(crate) fn flush_pending_tier10(&mut self, competence: Competence) {
        let buffered = self.pending_tier10.remove(&competence).unwrap_or_default();
        self.accepted.extend(buffered.iter().cloned());
        self.promoted_tier10
            .entry(competence)
            .or_default()
            .extend(buffered);
    }
}

pub(crate) fn count_of(counts: &BTreeMap<Competence, u32>, competence: &Competence) -> u32 {
    counts.get(competence).copied().unwrap_or(0)
}
