use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::eligibility::router::evaluate_handler;
use crate::workflows::eligibility::{eligibility_router, EligibilityRequest, EligibilityService};

fn post_json(payload: &Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).expect("serialize payload");
    Request::post("/api/v1/eligibility")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request builds")
}

#[tokio::test]
async fn eligibility_route_returns_report_and_progress() {
    let (service, _, _) = build_service();
    let router = eligibility_router(service);
    let csv = csv_export(&[
        "FULANO;202301;355030;225142;MEDICO DE FAMILIA;9000;UBS Norte;40;0",
        "FULANO;202302;355030;225142;MEDICO DE FAMILIA;9000;UBS Norte;20;0",
    ]);

    let response = router
        .oneshot(post_json(&json!({ "professional": "FULANO", "csv": csv })))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["professional"], "FULANO");
    assert_eq!(body["total"], 1.5);
    assert_eq!(body["verdict"], "NOT ELIGIBLE");
    assert_eq!(body["pending"], 46.5);
    assert_eq!(body["credited_months"][0]["competence"], "02/2023");
    assert_eq!(body["credited_months"][0]["tier"], "twenty_hours");
    assert!(body["progress"]
        .as_array()
        .is_some_and(|events| !events.is_empty()));
}

#[tokio::test]
async fn eligibility_route_requires_exactly_one_source() {
    let (service, _, _) = build_service();
    let router = eligibility_router(service);

    let response = router
        .clone()
        .oneshot(post_json(&json!({ "professional": "FULANO" })))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let both = json!({
        "csv": csv_export(&[]),
        "history": { "nome": "FULANO", "vinculos": [] },
    });
    let response = router
        .oneshot(post_json(&both))
        .await
        .expect("route responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eligibility_route_rejects_malformed_exports() {
    let (service, _, _) = build_service();
    let router = eligibility_router(service);

    let response = router
        .oneshot(post_json(&json!({ "csv": "NOME;CNES\nFULANO;1\n" })))
        .await
        .expect("route responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("COMP.")));
    assert_eq!(body["progress"][1]["status"], "error");
}

#[tokio::test]
async fn evaluate_handler_reports_store_outage_as_unavailable() {
    let service = Arc::new(EligibilityService::new(
        Arc::new(FailingLookup),
        Arc::new(StaticValidator::new(true)),
    ));
    let request = EligibilityRequest {
        professional: None,
        csv: Some(csv_export(&[
            "FULANO;202301;355030;225125;MEDICO CLINICO;2077485;UBS Vila;40;0",
        ])),
        history: None,
    };

    let response =
        evaluate_handler::<FailingLookup, StaticValidator>(State(service), axum::Json(request))
            .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("database is locked")));
}

#[tokio::test]
async fn evaluate_handler_accepts_history_documents() {
    let (service, _, _) = build_service();
    let history = serde_json::from_value(json!({
        "nome": "FULANO",
        "vinculos": [
            {"nuComp": "202305", "coMun": "355030", "cnes": "2077485", "noFant": "UBS Vila",
             "dsCbo": "MEDICO CLINICO", "chAmb": "40"}
        ]
    }))
    .expect("history parses");
    let request = EligibilityRequest {
        professional: Some("FULANO".to_string()),
        csv: None,
        history: Some(history),
    };

    let response =
        evaluate_handler::<MemoryLookup, StaticValidator>(State(service), axum::Json(request))
            .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total"], 1.0);
    assert_eq!(body["accepted_rows"][0]["facility_id"], "2077485");
}
