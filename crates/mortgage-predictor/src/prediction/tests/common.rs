use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::prediction::domain::{FeatureVector, LoanField, RawSubmission, RawValue};
use crate::prediction::model::{LoanModel, ModelError, ModelOutput};
use crate::prediction::service::PredictionService;

/// The worked example from the product brief; passes validation untouched.
pub(super) fn valid_submission() -> RawSubmission {
    serde_json::from_value(json!({
        "MonthsDelinquent": 0,
        "CreditScore": 700,
        "MonthsInRepayment": 12,
        "NumBorrowers": 1,
        "Channel": "Retail",
        "LTV": 80,
        "FirstTimeHomebuyer": "Y",
        "OCLTV": 75,
        "DTI": 36,
        "OrigInterestRate": 3.5,
        "OrigUPB": 300000,
        "OrigLoanTerm": 360
    }))
    .expect("example submission deserializes")
}

/// Same values as [`valid_submission`], as a browser form would post them.
pub(super) fn form_submission() -> RawSubmission {
    valid_submission()
        .iter()
        .map(|(name, value)| (name.to_string(), RawValue::Text(value.to_string())))
        .collect()
}

pub(super) fn submission_with(field: LoanField, value: impl Into<RawValue>) -> RawSubmission {
    let mut submission = valid_submission();
    submission.insert(field.name(), value);
    submission
}

pub(super) fn regression_output() -> ModelOutput {
    ModelOutput::WithRegression {
        label: "Not Delinquent".to_string(),
        value: 0.087,
    }
}

pub(super) fn delinquent_output() -> ModelOutput {
    ModelOutput::ClassificationOnly {
        label: "Delinquent".to_string(),
    }
}

/// Deterministic model returning a fixed output and recording what it saw.
pub(super) struct StubModel {
    output: ModelOutput,
    calls: AtomicUsize,
    last_features: Mutex<Option<FeatureVector>>,
}

impl StubModel {
    pub(super) fn new(output: ModelOutput) -> Self {
        Self {
            output,
            calls: AtomicUsize::new(0),
            last_features: Mutex::new(None),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_features(&self) -> Option<FeatureVector> {
        self.last_features
            .lock()
            .expect("features mutex poisoned")
            .clone()
    }
}

impl LoanModel for StubModel {
    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_features.lock().expect("features mutex poisoned") = Some(features.clone());
        Ok(self.output.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }
}

/// Model whose inference always fails, optionally only on the first call.
pub(super) struct FailingModel {
    message: &'static str,
    fail_once: bool,
    calls: AtomicUsize,
}

impl FailingModel {
    pub(super) fn always(message: &'static str) -> Self {
        Self {
            message,
            fail_once: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn once(message: &'static str) -> Self {
        Self {
            message,
            fail_once: true,
            calls: AtomicUsize::new(0),
        }
    }
}

impl LoanModel for FailingModel {
    fn predict(&self, _features: &FeatureVector) -> Result<ModelOutput, ModelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_once && call > 0 {
            return Ok(regression_output());
        }
        Err(ModelError::Inference(self.message.to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }
}

/// Model that panics on its first call (indexing past its data) and succeeds afterwards.
pub(super) struct PanickingModel {
    calls: AtomicUsize,
}

impl PanickingModel {
    pub(super) fn once() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl LoanModel for PanickingModel {
    fn predict(&self, _features: &FeatureVector) -> Result<ModelOutput, ModelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            let coefficients: Vec<f64> = Vec::new();
            let index = 3 + call;
            let _ = coefficients[index];
        }
        Ok(regression_output())
    }

    fn name(&self) -> &str {
        "panicking"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }
}

pub(super) fn stub_service(output: ModelOutput) -> (PredictionService<StubModel>, Arc<StubModel>) {
    let model = Arc::new(StubModel::new(output));
    (PredictionService::new(model.clone()), model)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
