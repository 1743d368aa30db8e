use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use super::domain::FeatureRecord;
use super::model::{LoanModel, ModelError, ModelOutput};

/// Attached to results whose classification suppressed the regression estimate.
pub const NO_PREPAYMENT_NOTE: &str = "Delinquent borrowers have no prepayment";

/// Reconciled output of one prediction run.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub classification: String,
    pub regression: Option<f64>,
    pub note: Option<&'static str>,
    pub elapsed: Duration,
}

impl PredictionResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Error raised when the model fails during inference. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("An error occurred: {source}")]
    ModelInvocation { source: ModelError },
    /// The model panicked instead of returning an error.
    #[error("An error occurred: {0}")]
    Unhandled(String),
}

/// Runs a validated record through the model and reconciles both heads.
pub struct PredictionOrchestrator<M: ?Sized> {
    model: Arc<M>,
}

impl<M> PredictionOrchestrator<M>
where
    M: LoanModel + ?Sized,
{
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<PredictionResult, PredictionError> {
        let started = Instant::now();
        let features = record.feature_vector();

        debug!(model = self.model.name(), "making predictions");
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.model.predict(&features)));
        let output = match attempt {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                error!(error = %source, "error during prediction");
                return Err(PredictionError::ModelInvocation { source });
            }
            Err(payload) => {
                let cause = panic_message(payload.as_ref());
                error!(error = %cause, "model panicked during prediction");
                return Err(PredictionError::Unhandled(cause));
            }
        };

        let elapsed = started.elapsed();
        debug!(
            elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
            "prediction completed"
        );
        Ok(reconcile(output, elapsed))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "model panicked".to_string()
    }
}

/// Suppression rule: a classification-only output carries the no-prepayment note
/// and never a fabricated regression value.
pub fn reconcile(output: ModelOutput, elapsed: Duration) -> PredictionResult {
    match output {
        ModelOutput::WithRegression { label, value } => PredictionResult {
            classification: label,
            regression: Some(value),
            note: None,
            elapsed,
        },
        ModelOutput::ClassificationOnly { label } => PredictionResult {
            classification: label,
            regression: None,
            note: Some(NO_PREPAYMENT_NOTE),
            elapsed,
        },
    }
}
