use serde::{Deserialize, Serialize};

/// Outcome of checking a facility against the registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstablishmentStatus {
    Qualifies,
    Disqualifies,
    /// The facility is absent from the snapshot entirely.
    Unknown,
}

/// Read access to the establishment registry snapshot.
pub trait EstablishmentLookup: Send + Sync {
    fn lookup(&self, composite_id: &str) -> Result<EstablishmentStatus, StoreError>;
}

/// Fallback consulted for facilities the snapshot does not know about.
pub trait OnlineValidator: Send + Sync {
    fn validate(
        &self,
        facility_id: &str,
        facility_name: &str,
    ) -> Result<bool, OnlineValidationError>;
}

/// Infrastructure failure of the snapshot store. Never a statement about the facility.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not open establishment store: {0}")]
    Unavailable(String),
    #[error("lookup for {composite_id} failed: {reason}")]
    Query {
        composite_id: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum OnlineValidationError {
    /// Only this facility could not be checked; the remaining ones still resolve.
    #[error("facility {facility_id} could not be validated online: {reason}")]
    Facility { facility_id: String, reason: String },
    #[error("online validation unavailable: {0}")]
    Unavailable(String),
}
