use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_registration_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use registration_wizard::config::AppConfig;
use registration_wizard::error::AppError;
use registration_wizard::telemetry;
use registration_wizard::workflows::registration::{RegistrationApi, SubmissionPipeline};
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pipeline = SubmissionPipeline::from_webhooks(&config.webhooks)?;
    let stages = pipeline.stages();
    let api = RegistrationApi::new(pipeline);

    let app = with_registration_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, ?stages, "registration service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
