use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_custody_routes;
use crate::scheduler::spawn_alert_scan;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use folder_custody::config::{AppConfig, ConfigError};
use folder_custody::custody::{CustodyService, InMemoryStore, SystemClock};
use folder_custody::error::AppError;
use folder_custody::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(secs) = args.scan_interval_secs.take() {
        if secs == 0 {
            return Err(ConfigError::InvalidNumber {
                name: "--scan-interval-secs",
            }
            .into());
        }
        config.custody.scan_interval = Duration::from_secs(secs);
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let custody_service = Arc::new(CustodyService::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(SystemClock),
        config.custody.policy,
    ));
    let scan_task = spawn_alert_scan(custody_service.clone(), config.custody.scan_interval);

    let app = with_custody_routes(custody_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        active_deadline_days = config.custody.policy.active_deadline_days,
        dismissed_deadline_days = config.custody.policy.dismissed_deadline_days,
        "folder custody service ready"
    );

    let served = axum::serve(listener, app).await;
    scan_task.abort();
    served?;
    Ok(())
}
