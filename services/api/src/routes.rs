use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use cnes_eligibility::workflows::eligibility::{
    eligibility_router, EligibilityService, EstablishmentLookup, OnlineValidator,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_eligibility_routes<L, V>(service: Arc<EligibilityService<L, V>>) -> axum::Router
where
    L: EstablishmentLookup + 'static,
    V: OnlineValidator + 'static,
{
    eligibility_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let (status, label) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "initializing")
    };

    (status, Json(json!({ "status": label })))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::PolicyValidator;
    use axum::body::Body;
    use axum::http::Request;
    use cnes_eligibility::config::UnknownEstablishmentPolicy;
    use cnes_eligibility::workflows::eligibility::{EstablishmentStatus, StoreError};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    struct EmptySnapshot;

    impl EstablishmentLookup for EmptySnapshot {
        fn lookup(&self, _composite_id: &str) -> Result<EstablishmentStatus, StoreError> {
            Ok(EstablishmentStatus::Unknown)
        }
    }

    fn app(policy: UnknownEstablishmentPolicy, ready: bool) -> (axum::Router, Arc<AtomicBool>) {
        let readiness = Arc::new(AtomicBool::new(ready));
        let state = AppState {
            readiness: readiness.clone(),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let service = Arc::new(EligibilityService::new(
            Arc::new(EmptySnapshot),
            Arc::new(PolicyValidator::new(policy)),
        ));
        let router = with_eligibility_routes(service).layer(Extension(state));
        (router, readiness)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request")
    }

    fn eligibility_request() -> Request<Body> {
        let csv = "COMP.;IBGE;CNES;ESTABELECIMENTO;CHS AMB.;DESCRICAO CBO\n\
202301;355030;2077485;UBS Vila;40;MEDICO CLINICO\n";
        Request::post("/api/v1/eligibility")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({ "csv": csv })).expect("serialize payload"),
            ))
            .expect("request builds")
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let (router, readiness) = app(UnknownEstablishmentPolicy::Reject, false);

        let response = router
            .clone()
            .oneshot(get("/ready"))
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        readiness.store(true, Ordering::Release);
        let response = router.oneshot(get("/ready")).await.expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ready");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let (router, _) = app(UnknownEstablishmentPolicy::Reject, true);
        let response = router
            .oneshot(get("/metrics"))
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn unknown_facility_policy_decides_clinician_credit() {
        let (router, _) = app(UnknownEstablishmentPolicy::Accept, true);
        let response = router
            .oneshot(eligibility_request())
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total"], 1.0);

        let (router, _) = app(UnknownEstablishmentPolicy::Reject, true);
        let response = router
            .oneshot(eligibility_request())
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["total"], 0.0);
    }
}
