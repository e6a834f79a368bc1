use cnes_eligibility::config::UnknownEstablishmentPolicy;
use cnes_eligibility::workflows::eligibility::{OnlineValidationError, OnlineValidator};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Answers the online fallback from configuration instead of consulting the public
/// registry page.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PolicyValidator {
    policy: UnknownEstablishmentPolicy,
}

impl PolicyValidator {
    pub(crate) fn new(policy: UnknownEstablishmentPolicy) -> Self {
        Self { policy }
    }
}

impl OnlineValidator for PolicyValidator {
    fn validate(
        &self,
        facility_id: &str,
        facility_name: &str,
    ) -> Result<bool, OnlineValidationError> {
        let accepted = self.policy == UnknownEstablishmentPolicy::Accept;
        debug!(
            %facility_id,
            %facility_name,
            accepted,
            "facility missing from snapshot, applying configured policy"
        );
        Ok(accepted)
    }
}
