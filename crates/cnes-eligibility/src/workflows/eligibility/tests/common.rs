use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::workflows::eligibility::{
    CareerEntry, Competence, EligibilityService, EstablishmentLookup, EstablishmentStatus,
    OnlineValidationError, OnlineValidator, StoreError,
};

pub(super) const FAMILY: &str = "MEDICO DA ESTRATEGIA DE SAUDE DA FAMILIA";
pub(super) const CLINICIAN: &str = "MEDICO CLINICO";
pub(super) const GENERALIST: &str = "MÉDICO GENERALISTA";

pub(super) const MUNICIPALITY: &str = "355030";
pub(super) const QUALIFIED_FACILITY: &str = "2077485";
pub(super) const PLAIN_FACILITY: &str = "2077000";
pub(super) const UNLISTED_FACILITY: &str = "9999999";

pub(super) fn month(raw: &str) -> Competence {
    Competence::parse(raw).expect("valid competence")
}

pub(super) fn entry(hours: f64, occupation: &str, facility: &str, competence: &str) -> CareerEntry {
    CareerEntry {
        facility_id: facility.to_string(),
        municipality_code: MUNICIPALITY.to_string(),
        facility_name: format!("UBS {facility}"),
        weekly_hours: hours,
        occupation: occupation.to_string(),
        competence: month(competence),
    }
}

pub(super) fn qualified() -> BTreeSet<String> {
    BTreeSet::from([QUALIFIED_FACILITY.to_string()])
}

/// `count` consecutive full-time months starting at January 2015.
pub(super) fn full_time_months(count: u32) -> Vec<CareerEntry> {
    (0..count)
        .map(|offset| {
            let competence = format!("{:02}/{}", offset % 12 + 1, 2015 + offset / 12);
            entry(40.0, FAMILY, PLAIN_FACILITY, &competence)
        })
        .collect()
}

pub(super) fn composite(facility: &str) -> String {
    format!("{MUNICIPALITY}{facility}")
}

/// Snapshot answering from a fixed table; everything else is `Unknown`.
#[derive(Default)]
pub(super) struct MemoryLookup {
    statuses: HashMap<String, EstablishmentStatus>,
    calls: Mutex<Vec<String>>,
}

impl MemoryLookup {
    pub(super) fn with(entries: &[(&str, EstablishmentStatus)]) -> Self {
        Self {
            statuses: entries
                .iter()
                .map(|(facility, status)| (composite(facility), *status))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn standard() -> Self {
        Self::with(&[
            (QUALIFIED_FACILITY, EstablishmentStatus::Qualifies),
            (PLAIN_FACILITY, EstablishmentStatus::Disqualifies),
        ])
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl EstablishmentLookup for MemoryLookup {
    fn lookup(&self, composite_id: &str) -> Result<EstablishmentStatus, StoreError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(composite_id.to_string());
        Ok(self
            .statuses
            .get(composite_id)
            .copied()
            .unwrap_or(EstablishmentStatus::Unknown))
    }
}

pub(super) struct FailingLookup;

impl EstablishmentLookup for FailingLookup {
    fn lookup(&self, _composite_id: &str) -> Result<EstablishmentStatus, StoreError> {
        Err(StoreError::Unavailable("database is locked".to_string()))
    }
}

/// Fallback with a fixed answer that records every facility it was asked about.
pub(super) struct StaticValidator {
    answer: bool,
    calls: Mutex<Vec<String>>,
}

impl StaticValidator {
    pub(super) fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl OnlineValidator for StaticValidator {
    fn validate(
        &self,
        facility_id: &str,
        _facility_name: &str,
    ) -> Result<bool, OnlineValidationError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(facility_id.to_string());
        Ok(self.answer)
    }
}

pub(super) struct FacilityFailingValidator;

impl OnlineValidator for FacilityFailingValidator {
    fn validate(
        &self,
        facility_id: &str,
        _facility_name: &str,
    ) -> Result<bool, OnlineValidationError> {
        Err(OnlineValidationError::Facility {
            facility_id: facility_id.to_string(),
            reason: "public page timed out".to_string(),
        })
    }
}

pub(super) struct UnavailableValidator;

impl OnlineValidator for UnavailableValidator {
    fn validate(
        &self,
        _facility_id: &str,
        _facility_name: &str,
    ) -> Result<bool, OnlineValidationError> {
        Err(OnlineValidationError::Unavailable(
            "browser session closed".to_string(),
        ))
    }
}

pub(super) fn build_service() -> (
    Arc<EligibilityService<MemoryLookup, StaticValidator>>,
    Arc<MemoryLookup>,
    Arc<StaticValidator>,
) {
    let lookup = Arc::new(MemoryLookup::standard());
    let validator = Arc::new(StaticValidator::new(false));
    let service = Arc::new(EligibilityService::new(lookup.clone(), validator.clone()));
    (service, lookup, validator)
}

pub(super) const CSV_HEADER: &str =
    "NOME;COMP.;IBGE;CBO;DESCRICAO CBO;CNES;ESTABELECIMENTO;CHS AMB.;CHS HOSP.";

pub(super) fn csv_export(rows: &[&str]) -> String {
    let mut csv = String::from(CSV_HEADER);
    for row in rows {
        csv.push('\n');
        csv.push_str(row);
    }
    csv.push('\n');
    csv
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
