//! Weekly-hours tiers and the ordered passes that turn registrations into monthly credit.
//!
//! Passes run strictly in `TIER_STRATEGIES` order (40, 30, 20, 10). Each pass scans every
//! registration, then consolidates once; later passes read the state earlier passes left
//! behind, so the order and the consolidation timing are part of the rules.

mod accumulator;
mod part_time;

pub use accumulator::CreditAccumulator;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::domain::{CareerEntry, Competence};
use super::occupation::OccupationVocabulary;
use accumulator::count_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    FullTime,
    ThirtyHours,
    TwentyHours,
    TenHours,
}

impl Tier {
    /// Credit contributed by one occurrence left in this tier after all passes.
    pub fn weight(self) -> f64 {
        match self {
            Tier::FullTime => 1.0,
            Tier::ThirtyHours => 0.75,
            Tier::TwentyHours => 0.5,
            Tier::TenHours => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::FullTime => "40 hours or more",
            Tier::ThirtyHours => "30 to 39 hours",
            Tier::TwentyHours => "20 to 29 hours",
            Tier::TenHours => "10 to 19 hours",
        }
    }
}

/// Band `[lower_bound, upper_bound)` of weekly hours handled by one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStrategy {
    pub tier: Tier,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Occurrences per month counted by the tier; extra ones are dropped.
    pub cap: Option<u32>,
}

pub const TIER_STRATEGIES: [TierStrategy; 4] = [
    TierStrategy {
        tier: Tier::FullTime,
        lower_bound: 40.0,
        upper_bound: f64::INFINITY,
        cap: None,
    },
    TierStrategy {
        tier: Tier::ThirtyHours,
        lower_bound: 30.0,
        upper_bound: 40.0,
        cap: Some(2),
    },
    TierStrategy {
        tier: Tier::TwentyHours,
        lower_bound: 20.0,
        upper_bound: 30.0,
        cap: Some(2),
    },
    TierStrategy {
        tier: Tier::TenHours,
        lower_bound: 10.0,
        upper_bound: 20.0,
        cap: Some(part_time::MAX_OCCURRENCES),
    },
];

impl TierStrategy {
    pub fn in_band(&self, weekly_hours: f64) -> bool {
        self.lower_bound <= weekly_hours && weekly_hours < self.upper_bound
    }

    pub fn admits(&self, entry: &CareerEntry, accumulator: &CreditAccumulator) -> bool {
        if !self.in_band(entry.weekly_hours) || accumulator.is_at_top(&entry.competence) {
            return false;
        }

        OccupationVocabulary::classify(&entry.occupation)
            .map(|vocabulary| {
                vocabulary.admits(
                    accumulator
                        .qualified_facilities()
                        .contains(&entry.facility_id),
                )
            })
            .unwrap_or(false)
    }

    pub fn accept(&self, entry: &CareerEntry, accumulator: &mut CreditAccumulator) {
        match self.tier {
            Tier::FullTime => {
                if !accumulator.is_at_top(&entry.competence) {
                    accumulator.promote_to_top(entry.competence);
                    accumulator.accept_row(entry);
                }
            }
            Tier::ThirtyHours => {
                let CreditAccumulator {
                    tier30,
                    accepted,
                    ..
                } = accumulator;
                accept_capped(self, entry, tier30, accepted)
            }
            Tier::TwentyHours => {
                let CreditAccumulator {
                    tier20,
                    accepted,
                    ..
                } = accumulator;
                accept_capped(self, entry, tier20, accepted)
            }
            Tier::TenHours => part_time::accept(entry, accumulator),
        }
    }

    pub fn consolidate(&self, accumulator: &mut CreditAccumulator) {
        match self.tier {
            Tier::FullTime => {}
            Tier::ThirtyHours => promote_saturated_thirty(accumulator, self.cap.unwrap_or(2)),
            Tier::TwentyHours => merge_thirty_and_twenty(accumulator),
            Tier::TenHours => part_time::consolidate(accumulator),
        }
    }
}

fn accept_capped(
    strategy: &TierStrategy,
    entry: &CareerEntry,
    counts: &mut BTreeMap<Competence, u32>,
    accepted: &mut Vec<CareerEntry>,
) {
    let cap = strategy.cap.unwrap_or(u32::MAX);
    let count = counts.entry(entry.competence).or_insert(0);
    if *count >= cap {
        debug!(competence = %entry.competence, tier = ?strategy.tier, "over monthly cap");
        return;
    }
    *count += 1;
    accepted.push(entry.clone());
}

fn promote_saturated_thirty(accumulator: &mut CreditAccumulator, cap: u32) {
    let saturated: Vec<_> = accumulator
        .tier30
        .iter()
        .filter(|(_, count)| **count >= cap)
        .map(|(competence, _)| *competence)
        .collect();

    for competence in saturated {
        accumulator.tier30.remove(&competence);
        accumulator.promote_to_top(competence);
    }
}

/// A 30-hour and a 20-hour registration in the same month add up to full time.
fn merge_thirty_and_twenty(accumulator: &mut CreditAccumulator) {
    let overlapping: Vec<_> = accumulator
        .tier30
        .keys()
        .filter(|competence| count_of(&accumulator.tier20, competence) > 0)
        .copied()
        .collect();

    for competence in overlapping {
        accumulator.tier30.remove(&competence);
        accumulator.tier20.remove(&competence);
        accumulator.promote_to_top(competence);
    }
}

/// Runs every tier pass over the registrations, mutating `accumulator` in place.
pub fn classify(entries: &[CareerEntry], accumulator: &mut CreditAccumulator) {
    let usable: Vec<&CareerEntry> = entries
        .iter()
        .filter(|entry| {
            let valid = entry.has_valid_hours();
            if !valid {
                warn!(
                    facility_id = %entry.facility_id,
                    competence = %entry.competence,
                    hours = entry.weekly_hours,
                    "skipping registration with invalid weekly hours"
                );
            }
            valid
        })
        .collect();

    for strategy in &TIER_STRATEGIES {
        for entry in &usable {
            if strategy.admits(entry, accumulator) {
                strategy.accept(entry, accumulator);
            }
        }
        strategy.consolidate(accumulator);

        debug!(
            tier = ?strategy.tier,
            months_at_top = accumulator.months_at_top.len(),
            tier30 = accumulator.tier30.len(),
            tier20 = accumulator.tier20.len(),
            "tier pass finished"
        );
    }
}
