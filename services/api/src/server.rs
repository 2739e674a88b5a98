use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryProspectRepository};
use crate::routes::with_prospect_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use funnel_crm::config::AppConfig;
use funnel_crm::error::AppError;
use funnel_crm::prospects::{ProspectCsvImporter, ProspectService};
use funnel_crm::telemetry;
use std::sync::atomic::Ordering;
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
    if let Some(seed_csv) = args.seed_csv.take() {
        config.storage.seed_csv = Some(seed_csv);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryProspectRepository::default());
    let prospect_service = Arc::new(ProspectService::new(repository));

    if let Some(path) = &config.storage.seed_csv {
        let drafts = ProspectCsvImporter::from_path(path)?;
        let seeded = prospect_service.import(drafts, Utc::now())?;
        info!(count = seeded.len(), path = %path.display(), "seeded prospect store");
    }

    let app = with_prospect_routes(prospect_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "funnel crm service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
