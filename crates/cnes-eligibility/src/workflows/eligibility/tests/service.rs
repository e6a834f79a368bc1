use std::io::Cursor;
use std::sync::Arc;

use super::common::*;
use crate::workflows::eligibility::{
    EligibilityError, EligibilityService, NoProgress, ProgressLog, ProgressStatus, Tier,
};
use crate::workflows::registry::{ProfessionalHistory, RegistryImportError};

#[test]
fn csv_export_produces_a_report_with_skipped_rows() {
    let (service, _, _) = build_service();
    let csv = csv_export(&[
        "FULANO;202301;355030;225142;MEDICO DA ESTRATEGIA DE SAUDE DA FAMILIA;9000;UBS Norte;40;0",
        "FULANO;202302;355030;225125;MEDICO CLINICO;2077485;UBS Vila;30;0",
        "FULANO;202302;355030;225125;MEDICO CLINICO;2077485;UBS Vila;30;0",
        "FULANO;abril;355030;225125;MEDICO CLINICO;2077485;UBS Vila;30;0",
    ]);

    let report = service
        .evaluate_csv(Cursor::new(csv), &NoProgress)
        .expect("report");

    assert_eq!(report.total, 2.0);
    assert_eq!(report.skipped_rows, 1);
    assert_eq!(report.accepted_rows.len(), 3);
    assert_eq!(report.accepted_rows[0].facility_id, "2077485");
    assert_eq!(report.accepted_rows[2].facility_id, "0009000");
    assert!(report
        .credited_months
        .iter()
        .all(|credited| credited.tier == Tier::FullTime));
}

#[test]
fn padded_facility_codes_match_the_snapshot() {
    let (service, lookup, _) = build_service();
    let csv = csv_export(&[
        "FULANO;202303;355030;225125;MEDICO CLINICO;77485;UBS Vila;40;0",
    ]);

    let _ = service
        .evaluate_csv(Cursor::new(csv), &NoProgress)
        .expect("report");
    assert_eq!(lookup.calls(), vec!["3550300077485".to_string()]);
}

#[test]
fn progress_walks_through_every_step() {
    let (service, _, _) = build_service();
    let csv = csv_export(&[
        "FULANO;202303;355030;225125;MEDICO CLINICO;2077485;UBS Vila;40;0",
    ]);
    let progress = ProgressLog::default();

    service
        .evaluate_csv(Cursor::new(csv), &progress)
        .expect("report");

    let completed: Vec<u8> = progress
        .events()
        .iter()
        .filter(|event| event.status == ProgressStatus::Completed)
        .map(|event| event.step)
        .collect();
    assert_eq!(completed, vec![1, 2, 3]);
    let last = progress.events().pop().expect("events published");
    assert!(last.message.contains("ELIGIBLE"));
}

#[test]
fn malformed_export_is_invalid_input() {
    let (service, _, _) = build_service();
    let progress = ProgressLog::default();

    let error = service
        .evaluate_csv(Cursor::new("NOME;CNES\nFULANO;1\n"), &progress)
        .expect_err("missing columns");

    assert!(matches!(
        error,
        EligibilityError::InvalidInput(RegistryImportError::MissingColumns(_))
    ));
    let last = progress.events().pop().expect("error event");
    assert_eq!(last.status, ProgressStatus::Error);
    assert_eq!(last.step, 1);
}

#[test]
fn store_outage_is_an_error_not_an_empty_history() {
    let service = EligibilityService::new(
        Arc::new(FailingLookup),
        Arc::new(StaticValidator::new(true)),
    );
    let progress = ProgressLog::default();
    let entries = vec![
        entry(40.0, CLINICIAN, QUALIFIED_FACILITY, "01/2023"),
        entry(40.0, FAMILY, PLAIN_FACILITY, "02/2023"),
    ];

    let error = service
        .evaluate_entries(&entries, &progress)
        .expect_err("store outage");

    assert!(matches!(error, EligibilityError::StoreUnavailable(_)));
    let last = progress.events().pop().expect("error event");
    assert_eq!(last.status, ProgressStatus::Error);
    assert_eq!(last.step, 2);
}

#[test]
fn fallback_outage_is_reported_as_unavailable() {
    let service = EligibilityService::new(
        Arc::new(MemoryLookup::standard()),
        Arc::new(UnavailableValidator),
    );
    let entries = vec![entry(40.0, CLINICIAN, UNLISTED_FACILITY, "01/2023")];

    let error = service
        .evaluate_entries(&entries, &NoProgress)
        .expect_err("fallback outage");
    assert!(matches!(error, EligibilityError::ValidationUnavailable(_)));
}

#[test]
fn facility_failures_surface_in_the_report() {
    let service = EligibilityService::new(
        Arc::new(MemoryLookup::standard()),
        Arc::new(FacilityFailingValidator),
    );
    let entries = vec![
        entry(40.0, CLINICIAN, UNLISTED_FACILITY, "01/2023"),
        entry(40.0, CLINICIAN, QUALIFIED_FACILITY, "02/2023"),
    ];

    let report = service
        .evaluate_entries(&entries, &NoProgress)
        .expect("report");
    assert_eq!(report.total, 1.0);
    assert_eq!(report.establishment_failures.len(), 1);
    assert_eq!(
        report.establishment_failures[0].facility_id,
        UNLISTED_FACILITY
    );
}

#[test]
fn history_document_is_evaluated() {
    let (service, _, _) = build_service();
    let history: ProfessionalHistory = serde_json::from_str(
        r#"{
            "nome": "FULANO",
            "cns": "700000000000000",
            "vinculos": [
                {"nuComp": "jan/23", "coMun": "355030", "cnes": "2077485", "noFant": "UBS Vila",
                 "dsCbo": "MEDICO CLINICO", "chAmb": "40"},
                {"nuComp": "fev/23", "coMun": "355030", "cnes": "2077485", "noFant": "UBS Vila",
                 "dsCbo": "MEDICO CLINICO", "chAmb": 20}
            ]
        }"#,
    )
    .expect("history parses");

    let report = service
        .evaluate_history(history, &NoProgress)
        .expect("report");
    assert_eq!(report.total, 1.5);
    assert_eq!(report.credited_months[0].competence, month("02/2023"));
}
