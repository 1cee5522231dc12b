use crate::cli::ServeArgs;
use crate::infra::{load_programs, AppState, InMemoryApplicationRepository, InMemoryProgramCatalog};
use crate::routes::with_matching_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lender_match::config::AppConfig;
use lender_match::error::AppError;
use lender_match::matching::LenderMatchService;
use lender_match::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let programs = load_programs(config.catalog.program_catalog.as_deref())?;
    info!(
        programs = programs.len(),
        source = config
            .catalog
            .program_catalog
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "demo".to_string()),
        "program catalog loaded"
    );

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let catalog = Arc::new(InMemoryProgramCatalog::with_programs(programs));
    let service = Arc::new(LenderMatchService::new(repository, catalog));

    let app = with_matching_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lender match service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
