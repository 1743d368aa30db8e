use crate::cli::ServeArgs;
use crate::infra::{load_model, AppState};
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mortgage_predictor::config::AppConfig;
use mortgage_predictor::error::AppError;
use mortgage_predictor::prediction::{LoanModel, PredictionService};
use mortgage_predictor::telemetry;
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

    let model = load_model(&config.model, args.model.take())?;
    let model_name = model.name().to_string();
    let model_version = model.version().to_string();
    let service = Arc::new(PredictionService::new(model));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let app = with_prediction_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        model = %model_name,
        version = %model_version,
        "mortgage prediction service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
