//! End-to-end scenarios through the public service facade using the bundled model artifact.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use mortgage_predictor::prediction::{
    submissions_from_csv, ArtifactModel, LoanModel, PredictionOutcome, PredictionService,
    RawSubmission, NO_PREPAYMENT_NOTE,
};

fn bundled_artifact() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../model/mortgage_pipeline.json")
}

fn service() -> PredictionService<ArtifactModel> {
    let model = ArtifactModel::from_path(bundled_artifact()).expect("bundled artifact loads");
    PredictionService::new(Arc::new(model))
}

fn submission(months_delinquent: i64) -> RawSubmission {
    serde_json::from_value(json!({
        "MonthsDelinquent": months_delinquent,
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
    .expect("submission deserializes")
}

#[test]
fn bundled_artifact_describes_itself() {
    let service = service();
    assert_eq!(service.model().name(), "mortgage-pipeline");
    assert_eq!(service.model().version(), "2024.1");
}

#[test]
fn current_borrower_receives_prepayment_estimate() {
    let outcome = service().handle(submission(0));

    let result = outcome.result().expect("prediction produced");
    assert_eq!(result.classification, "Not Delinquent");
    let estimate = result.regression.expect("prepayment estimate");
    assert!((estimate - 0.0923).abs() < 1e-3, "estimate was {estimate}");
    assert!(result.note.is_none());
}

#[test]
fn long_delinquency_suppresses_prepayment_estimate() {
    let outcome = service().handle(submission(24));

    let result = outcome.result().expect("prediction produced");
    assert_eq!(result.classification, "Delinquent");
    assert_eq!(result.regression, None);
    assert_eq!(result.note, Some(NO_PREPAYMENT_NOTE));
}

#[test]
fn deterministic_model_is_idempotent() {
    let service = service();
    let first = service.handle(submission(3));
    let second = service.handle(submission(3));

    let (first, second) = (
        first.result().expect("first"),
        second.result().expect("second"),
    );
    assert_eq!(first.classification, second.classification);
    assert_eq!(first.regression, second.regression);
}

#[test]
fn invalid_rows_in_a_batch_do_not_block_valid_ones() {
    let csv = "\
MonthsDelinquent,CreditScore,MonthsInRepayment,NumBorrowers,Channel,LTV,FirstTimeHomebuyer,OCLTV,DTI,OrigInterestRate,OrigUPB,OrigLoanTerm
0,700,12,1,Retail,80,Y,75,36,3.5,300000,360
0,200,12,1,Broker,80,N,75,36,3.5,300000,360
";
    let service = service();
    let outcomes: Vec<PredictionOutcome> = submissions_from_csv(csv.as_bytes())
        .expect("csv parses")
        .into_iter()
        .map(|submission| service.handle(submission))
        .collect();

    assert!(outcomes[0].result().is_some());
    assert_eq!(
        outcomes[1].message().as_deref(),
        Some("Attention: Please select CreditScore between 300 and 850.")
    );
}
