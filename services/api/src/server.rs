use crate::cli::ServeArgs;
use crate::infra::{build_rating_service, AppState};
use crate::routes::with_rating_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use rating_prompt::config::AppConfig;
use rating_prompt::error::AppError;
use rating_prompt::rating::{LoggingRatePresenter, PendingPromptPresenter};
use rating_prompt::telemetry;
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

    let prompts = Arc::new(PendingPromptPresenter::new());
    let rating_service = Arc::new(build_rating_service(
        &config,
        prompts.clone(),
        Arc::new(LoggingRatePresenter),
    ));

    let app = with_rating_routes(rating_service, prompts)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = %config.storage.path.display(),
        app_version = %config.rating.app_version,
        "rating prompt service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
