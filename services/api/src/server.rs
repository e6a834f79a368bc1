use crate::cli::ServeArgs;
use crate::infra::{AppState, PolicyValidator};
use crate::routes::with_eligibility_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use cnes_eligibility::config::AppConfig;
use cnes_eligibility::error::AppError;
use cnes_eligibility::telemetry::{self, LogTarget};
use cnes_eligibility::workflows::eligibility::{EligibilityService, SqliteEstablishmentStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, LogTarget::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(SqliteEstablishmentStore::open(
        &config.establishments.database_path,
    )?);
    let validator = Arc::new(PolicyValidator::new(
        config.establishments.unknown_establishments,
    ));
    let eligibility_service = Arc::new(EligibilityService::new(store, validator));

    let app = with_eligibility_routes(eligibility_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        database = %config.establishments.database_path.display(),
        "eligibility service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
