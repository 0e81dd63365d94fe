use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryMatchSource};
use crate::routes::with_team_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use grant_match::config::AppConfig;
use grant_match::error::AppError;
use grant_match::telemetry;
use grant_match::workflows::team_formation::{TeamFormationService, TeamSelector};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

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

    let source = match args.data.take() {
        Some(path) => {
            let source = InMemoryMatchSource::load(&path)?;
            info!(
                data = %path.display(),
                opportunities = source.opportunity_ids().len(),
                "loaded match document"
            );
            source
        }
        None => {
            warn!("no match document configured; every opportunity will be reported as unknown");
            InMemoryMatchSource::default()
        }
    };

    let service = Arc::new(TeamFormationService::new(
        Arc::new(source),
        Arc::new(TeamSelector::deterministic()),
        config.matching.clone(),
    ));

    let app = with_team_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        team_size = config.matching.team_size,
        top_n = config.matching.top_n,
        "grant team matcher ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
