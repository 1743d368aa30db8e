use std::sync::Arc;
use std::time::Duration;

use super::common::*;

use crate::prediction::domain::{FeatureCell, LoanField};
use crate::prediction::model::ModelOutput;
use crate::prediction::orchestrator::{
    reconcile, PredictionError, PredictionOrchestrator, NO_PREPAYMENT_NOTE,
};
use crate::prediction::validation::InputValidator;

fn record() -> crate::prediction::domain::FeatureRecord {
    InputValidator::new()
        .validate(&valid_submission())
        .expect("example is valid")
}

#[test]
fn regression_output_populates_both_heads() {
    let model = Arc::new(StubModel::new(regression_output()));
    let orchestrator = PredictionOrchestrator::new(model.clone());

    let result = orchestrator.predict(&record()).expect("prediction succeeds");

    assert_eq!(result.classification, "Not Delinquent");
    assert_eq!(result.regression, Some(0.087));
    assert_eq!(result.note, None);
    assert!(result.elapsed_seconds() >= 0.0);
    assert_eq!(model.calls(), 1);
}

#[test]
fn classification_only_output_carries_note_and_no_regression() {
    let orchestrator = PredictionOrchestrator::new(Arc::new(StubModel::new(delinquent_output())));

    let result = orchestrator.predict(&record()).expect("prediction succeeds");

    assert_eq!(result.classification, "Delinquent");
    assert_eq!(result.regression, None);
    assert_eq!(result.note, Some("Delinquent borrowers have no prepayment"));
}

#[test]
fn model_receives_columns_in_fitted_order() {
    let model = Arc::new(StubModel::new(regression_output()));
    PredictionOrchestrator::new(model.clone())
        .predict(&record())
        .expect("prediction succeeds");

    let features = model.last_features().expect("model invoked");
    let columns: Vec<LoanField> = features.columns().map(|(field, _)| field).collect();
    assert_eq!(columns, LoanField::COLUMN_ORDER);
    assert_eq!(features.len(), 12);
    assert_eq!(
        features.get(LoanField::Channel),
        &FeatureCell::Categorical("Retail".to_string())
    );
    assert_eq!(
        features.get(LoanField::OrigInterestRate),
        &FeatureCell::Numeric(3.5)
    );
    assert_eq!(features.get(LoanField::OrigUpb), &FeatureCell::Numeric(300_000.0));
}

#[test]
fn model_failure_is_reported_with_cause() {
    let orchestrator =
        PredictionOrchestrator::new(Arc::new(FailingModel::always("feature matrix is malformed")));

    let err = orchestrator
        .predict(&record())
        .expect_err("model failure surfaces");

    assert!(matches!(err, PredictionError::ModelInvocation { .. }));
    assert_eq!(
        err.to_string(),
        "An error occurred: feature matrix is malformed"
    );
}

#[test]
fn repeated_predictions_are_identical_apart_from_timing() {
    let orchestrator = PredictionOrchestrator::new(Arc::new(StubModel::new(regression_output())));
    let record = record();

    let first = orchestrator.predict(&record).expect("first prediction");
    let second = orchestrator.predict(&record).expect("second prediction");

    assert_eq!(first.classification, second.classification);
    assert_eq!(first.regression, second.regression);
}

#[test]
fn reconcile_is_an_explicit_branch_on_output_kind() {
    let elapsed = Duration::from_millis(5);
    let with_value = reconcile(
        ModelOutput::WithRegression {
            label: "Not Delinquent".to_string(),
            value: 0.0,
        },
        elapsed,
    );
    assert_eq!(with_value.regression, Some(0.0));
    assert!(with_value.note.is_none());

    let classification_only = reconcile(
        ModelOutput::ClassificationOnly {
            label: "Delinquent".to_string(),
        },
        elapsed,
    );
    assert_eq!(classification_only.note, Some(NO_PREPAYMENT_NOTE));
    assert_eq!(classification_only.elapsed, elapsed);
}

#[test]
fn model_panic_becomes_unhandled_failure() {
    let orchestrator = PredictionOrchestrator::new(Arc::new(PanickingModel::once()));

    let err = orchestrator
        .predict(&record())
        .expect_err("panic surfaces as an error");

    assert!(matches!(err, PredictionError::Unhandled(_)));
    assert!(err.to_string().starts_with("An error occurred: index out of bounds"));

    let result = orchestrator.predict(&record()).expect("next call succeeds");
    assert_eq!(result.regression, Some(0.087));
}
