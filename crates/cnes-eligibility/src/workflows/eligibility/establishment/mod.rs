//! Decides, per facility, whether clinician and generalist work performed there counts.
//!
//! Facilities are checked against the registry snapshot first. Only facilities the
//! snapshot has never heard of are sent to the online fallback. Store failures abort the
//! whole resolution so that an outage can never masquerade as "no qualifying facility".

mod lookup;
mod store;

pub use lookup::{
    EstablishmentLookup, EstablishmentStatus, OnlineValidationError, OnlineValidator, StoreError,
};
pub use store::{SqliteEstablishmentStore, QUALIFYING_SERVICE_CODES};

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::domain::CareerEntry;
use super::occupation::OccupationVocabulary;
use super::progress::{ProgressEvent, ProgressSink, STEP_ESTABLISHMENTS};

/// Weekly hours below which a registration never triggers a facility check.
pub const MIN_CANDIDATE_WEEKLY_HOURS: f64 = 10.0;

/// Facility that could not be validated and was left out of the qualified set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityFailure {
    pub facility_id: String,
    pub facility_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub qualified: BTreeSet<String>,
    /// Diagnostics only; never affects `qualified`.
    pub failures: Vec<FacilityFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    OnlineValidation(OnlineValidationError),
}

pub struct EstablishmentResolver<L, V> {
    lookup: Arc<L>,
    validator: Arc<V>,
}

impl<L, V> EstablishmentResolver<L, V>
where
    L: EstablishmentLookup,
    V: OnlineValidator,
{
    pub fn new(lookup: Arc<L>, validator: Arc<V>) -> Self {
        Self { lookup, validator }
    }

    pub fn resolve(
        &self,
        entries: &[CareerEntry],
        progress: &dyn ProgressSink,
    ) -> Result<Resolution, ResolutionError> {
        let candidates = candidate_entries(entries);
        if candidates.is_empty() {
            debug!("no registrations require a facility check");
        }

        let mut resolution = Resolution::default();
        let total = candidates.len();

        for (index, entry) in candidates.into_iter().enumerate() {
            progress.publish(ProgressEvent::in_progress(
                STEP_ESTABLISHMENTS,
                format!(
                    "Checking establishment {} ({})",
                    entry.facility_name, entry.facility_id
                ),
                percent(index, total),
            ));

            if self.facility_qualifies(entry, &mut resolution.failures)? {
                resolution.qualified.insert(entry.facility_id.clone());
            }
        }

        info!(
            checked = total,
            qualified = resolution.qualified.len(),
            failed = resolution.failures.len(),
            "establishment resolution finished"
        );

        Ok(resolution)
    }

    fn facility_qualifies(
        &self,
        entry: &CareerEntry,
        failures: &mut Vec<FacilityFailure>,
    ) -> Result<bool, ResolutionError> {
        let composite_id = entry.composite_id();
        let status = self.lookup.lookup(&composite_id).map_err(|err| {
            error!(%composite_id, %err, "establishment store failure");
            ResolutionError::Store(err)
        })?;

        match status {
            EstablishmentStatus::Qualifies => Ok(true),
            EstablishmentStatus::Disqualifies => {
                debug!(%composite_id, "facility lacks a qualifying service classification");
                Ok(false)
            }
            EstablishmentStatus::Unknown => {
                match self
                    .validator
                    .validate(&entry.facility_id, &entry.facility_name)
                {
                    Ok(valid) => {
                        debug!(facility_id = %entry.facility_id, valid, "online fallback answered");
                        Ok(valid)
                    }
                    Err(OnlineValidationError::Facility { reason, .. }) => {
                        warn!(facility_id = %entry.facility_id, %reason, "facility not validated");
                        failures.push(FacilityFailure {
                            facility_id: entry.facility_id.clone(),
                            facility_name: entry.facility_name.clone(),
                            reason,
                        });
                        Ok(false)
                    }
                    Err(err) => Err(ResolutionError::OnlineValidation(err)),
                }
            }
        }
    }
}

/// Registrations whose facility must be checked, one per facility id (first wins).
pub(crate) fn candidate_entries(entries: &[CareerEntry]) -> Vec<&CareerEntry> {
    let mut seen = HashSet::new();

    entries
        .iter()
        .filter(|entry| entry.has_valid_hours() && entry.weekly_hours >= MIN_CANDIDATE_WEEKLY_HOURS)
        .filter(|entry| {
            OccupationVocabulary::classify(&entry.occupation)
                .map(OccupationVocabulary::requires_qualified_facility)
                .unwrap_or(false)
        })
        .filter(|entry| seen.insert(entry.facility_id.as_str()))
        .collect()
}

fn percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((index * 100) / total) as u8
}
