use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEvaluationRepository};
use crate::routes::with_evaluation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fives::config::AppConfig;
use fives::error::AppError;
use fives::evaluation::{
    AnthropicClassifier, EvaluationOrchestrator, EvaluationService, PhotoLimits, TokioSleeper,
};
use fives::telemetry;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let classifier = AnthropicClassifier::new(&config.classifier)?;
    let orchestrator = EvaluationOrchestrator::with_parts(
        Arc::new(classifier),
        Arc::new(TokioSleeper),
        config.retry,
        PhotoLimits::default(),
    );
    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let evaluation_service = Arc::new(EvaluationService::new(orchestrator, repository));

    let app = with_evaluation_routes(evaluation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        model = %config.classifier.model,
        max_retries = config.retry.max_retries,
        "5S evaluation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
