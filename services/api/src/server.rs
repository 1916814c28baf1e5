use crate::cli::ServeArgs;
use crate::infra::{seeded_workflows, AppState};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use profmed::clock::SystemClock;
use profmed::config::AppConfig;
use profmed::error::AppError;
use profmed::notifications::LogSender;
use profmed::telemetry;
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

    let seeded = seeded_workflows(
        Arc::new(LogSender),
        config.workflow.clone(),
        Arc::new(SystemClock),
    )?;
    info!(
        employer = %seeded.directory.employer,
        clinic = %seeded.directory.clinic,
        "sample directory loaded"
    );
    tokio::spawn(seeded.refresher.run(seeded.events));

    let app = with_workflow_routes(seeded.workflows)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "order 131 workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
