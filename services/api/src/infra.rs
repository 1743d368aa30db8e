use metrics_exporter_prometheus::PrometheusHandle;
use mortgage_predictor::config::ModelConfig;
use mortgage_predictor::error::AppError;
use mortgage_predictor::prediction::ArtifactModel;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the artifact once; any failure here is fatal for the process.
pub(crate) fn load_model(
    config: &ModelConfig,
    override_path: Option<PathBuf>,
) -> Result<Arc<ArtifactModel>, AppError> {
    let path = override_path.unwrap_or_else(|| config.artifact_path.clone());
    let model = ArtifactModel::from_path(&path)?;
    Ok(Arc::new(model))
}
