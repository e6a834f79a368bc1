use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::decision::EligibilityReport;
use super::establishment::{EstablishmentLookup, OnlineValidator};
use super::progress::{ProgressEvent, ProgressLog};
use super::service::EligibilityService;
use crate::error::AppError;
use crate::workflows::registry::ProfessionalHistory;

/// Registrations to evaluate: either a registry CSV export or the history document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EligibilityRequest {
    #[serde(default)]
    pub professional: Option<String>,
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub history: Option<ProfessionalHistory>,
}

#[derive(Debug, Serialize)]
pub struct EligibilityResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professional: Option<String>,
    #[serde(flatten)]
    pub report: EligibilityReport,
    pub progress: Vec<ProgressEvent>,
}

enum RegistrySource {
    Csv(String),
    History(ProfessionalHistory),
}

/// Router builder exposing the eligibility computation over HTTP.
pub fn eligibility_router<L, V>(service: Arc<EligibilityService<L, V>>) -> Router
where
    L: EstablishmentLookup + 'static,
    V: OnlineValidator + 'static,
{
    Router::new()
        .route("/api/v1/eligibility", post(evaluate_handler::<L, V>))
        .with_state(service)
}

pub(crate) async fn evaluate_handler<L, V>(
    State(service): State<Arc<EligibilityService<L, V>>>,
    axum::Json(request): axum::Json<EligibilityRequest>,
) -> Response
where
    L: EstablishmentLookup + 'static,
    V: OnlineValidator + 'static,
{
    let EligibilityRequest {
        professional,
        csv,
        history,
    } = request;

    let source = match (csv, history) {
        (Some(csv), None) => RegistrySource::Csv(csv),
        (None, Some(history)) => RegistrySource::History(history),
        _ => {
            let payload = json!({
                "error": "provide exactly one of `csv` or `history`",
            });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let outcome = tokio::task::spawn_blocking(move || {
        let progress = ProgressLog::default();
        let result = match source {
            RegistrySource::Csv(csv) => {
                service.evaluate_csv(Cursor::new(csv.into_bytes()), &progress)
            }
            RegistrySource::History(history) => service.evaluate_history(history, &progress),
        };
        (result, progress.into_events())
    })
    .await;

    match outcome {
        Ok((Ok(report), progress)) => {
            let body = EligibilityResponse {
                professional,
                report,
                progress,
            };
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Ok((Err(err), progress)) => {
            let err = AppError::from(err);
            let payload = json!({
                "error": err.to_string(),
                "progress": progress,
            });
            (err.status_code(), axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            error!(%join_error, "eligibility computation aborted");
            let payload = json!({
                "error": "eligibility computation aborted",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
