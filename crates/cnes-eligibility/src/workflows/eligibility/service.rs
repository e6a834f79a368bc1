use std::io::Read;
use std::sync::Arc;

use tracing::info;

use super::compute_eligibility;
use super::decision::EligibilityReport;
use super::domain::CareerEntry;
use super::establishment::{
    EstablishmentLookup, EstablishmentResolver, OnlineValidationError, OnlineValidator,
    ResolutionError, StoreError,
};
use super::progress::{
    ProgressEvent, ProgressSink, STEP_CLASSIFICATION, STEP_ESTABLISHMENTS, STEP_INGESTION,
};
use crate::workflows::registry::{
    ProfessionalHistory, RegistryImport, RegistryImportError, RegistryImporter,
};

/// Service composing registry ingestion, establishment resolution and tier classification.
///
/// Holds no per-computation state: every call builds its own accumulator, so one service
/// can serve concurrent computations as long as each brings its own progress sink.
pub struct EligibilityService<L, V> {
    resolver: EstablishmentResolver<L, V>,
}

impl<L, V> EligibilityService<L, V>
where
    L: EstablishmentLookup + 'static,
    V: OnlineValidator + 'static,
{
    pub fn new(lookup: Arc<L>, validator: Arc<V>) -> Self {
        Self {
            resolver: EstablishmentResolver::new(lookup, validator),
        }
    }

    /// Computes eligibility for registrations that are already parsed.
    pub fn evaluate_entries(
        &self,
        entries: &[CareerEntry],
        progress: &dyn ProgressSink,
    ) -> Result<EligibilityReport, EligibilityError> {
        progress.publish(ProgressEvent::in_progress(
            STEP_ESTABLISHMENTS,
            "Checking the validity of establishments",
            0,
        ));
        let resolution = match self.resolver.resolve(entries, progress) {
            Ok(resolution) => resolution,
            Err(err) => {
                let err = EligibilityError::from(err);
                progress.publish(ProgressEvent::error(STEP_ESTABLISHMENTS, err.to_string()));
                return Err(err);
            }
        };
        progress.publish(ProgressEvent::completed(
            STEP_ESTABLISHMENTS,
            format!(
                "{} qualifying establishment(s) found",
                resolution.qualified.len()
            ),
        ));

        progress.publish(ProgressEvent::in_progress(
            STEP_CLASSIFICATION,
            "Classifying registrations by weekly hours",
            0,
        ));
        let mut report = compute_eligibility(entries, resolution.qualified);
        report.establishment_failures = resolution.failures;

        info!(
            total = report.total,
            verdict = report.verdict.label(),
            accepted = report.accepted_rows.len(),
            "eligibility computed"
        );
        progress.publish(ProgressEvent::completed(
            STEP_CLASSIFICATION,
            format!(
                "{:.2} valid months ({})",
                report.total,
                report.verdict.label()
            ),
        ));

        Ok(report)
    }

    pub fn evaluate_csv<R: Read>(
        &self,
        reader: R,
        progress: &dyn ProgressSink,
    ) -> Result<EligibilityReport, EligibilityError> {
        progress.publish(ProgressEvent::in_progress(
            STEP_INGESTION,
            "Reading professional registrations",
            0,
        ));
        match RegistryImporter::from_reader(reader) {
            Ok(import) => self.evaluate_import(import, progress),
            Err(err) => {
                let err = EligibilityError::InvalidInput(err);
                progress.publish(ProgressEvent::error(STEP_INGESTION, err.to_string()));
                Err(err)
            }
        }
    }

    pub fn evaluate_history(
        &self,
        history: ProfessionalHistory,
        progress: &dyn ProgressSink,
    ) -> Result<EligibilityReport, EligibilityError> {
        progress.publish(ProgressEvent::in_progress(
            STEP_INGESTION,
            "Reading professional registrations",
            0,
        ));
        self.evaluate_import(RegistryImporter::from_history(history), progress)
    }

    fn evaluate_import(
        &self,
        import: RegistryImport,
        progress: &dyn ProgressSink,
    ) -> Result<EligibilityReport, EligibilityError> {
        progress.publish(ProgressEvent::completed(
            STEP_INGESTION,
            format!(
                "{} registration(s) read, {} skipped",
                import.entries.len(),
                import.skipped
            ),
        ));

        let mut report = self.evaluate_entries(&import.entries, progress)?;
        report.skipped_rows = import.skipped;
        Ok(report)
    }
}

/// Failure of a whole computation. Distinct from a report with zero credited months.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("invalid input shape: {0}")]
    InvalidInput(#[from] RegistryImportError),
    #[error("backing store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    #[error("establishment validation unavailable: {0}")]
    ValidationUnavailable(#[source] OnlineValidationError),
}

impl From<ResolutionError> for EligibilityError {
    fn from(value: ResolutionError) -> Self {
        match value {
            ResolutionError::Store(err) => Self::StoreUnavailable(err),
            ResolutionError::OnlineValidation(err) => Self::ValidationUnavailable(err),
        }
    }
}
