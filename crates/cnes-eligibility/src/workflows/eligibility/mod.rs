//! Eligibility computation: establishment resolution, tier classification and the
//! 48-month verdict.

pub mod decision;
pub mod domain;
pub mod establishment;
pub mod occupation;
pub mod progress;
pub mod router;
pub mod service;
pub mod tiers;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

pub use decision::{
    CreditedMonth, EligibilityReport, SemesterSummary, Verdict, MONTHS_PER_SEMESTER,
    REQUIRED_MONTHS,
};
pub use domain::{CareerEntry, Competence, CompetenceError};
pub use establishment::{
    EstablishmentLookup, EstablishmentResolver, EstablishmentStatus, FacilityFailure,
    OnlineValidationError, OnlineValidator, Resolution, ResolutionError, SqliteEstablishmentStore,
    StoreError,
};
pub use occupation::OccupationVocabulary;
pub use progress::{NoProgress, ProgressEvent, ProgressLog, ProgressSink, ProgressStatus};
pub use router::{eligibility_router, EligibilityRequest, EligibilityResponse};
pub use service::{EligibilityError, EligibilityService};
pub use tiers::{CreditAccumulator, Tier, TierStrategy, TIER_STRATEGIES};

/// Classifies registrations against an already resolved set of qualifying facilities.
pub fn compute_eligibility(
    entries: &[CareerEntry],
    qualified_facilities: BTreeSet<String>,
) -> EligibilityReport {
    let mut accumulator = CreditAccumulator::new(qualified_facilities);
    tiers::classify(entries, &mut accumulator);
    decision::decide(accumulator)
}
