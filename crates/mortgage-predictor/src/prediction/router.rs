use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Serialize;
use serde_json::json;

use super::domain::RawSubmission;
use super::model::LoanModel;
use super::orchestrator::PredictionResult;
use super::service::{PredictionOutcome, PredictionService};
use super::validation::{form_schema, FormSchema};

/// Success payload consumed by the rendering layer.
#[derive(Debug, Serialize)]
pub struct PredictionView {
    pub classification_prediction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regression_prediction: Option<f64>,
    pub time_taken: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<&PredictionResult> for PredictionView {
    fn from(result: &PredictionResult) -> Self {
        Self {
            classification_prediction: result.classification.clone(),
            regression_prediction: result.regression,
            time_taken: result.elapsed_seconds(),
            message: result.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub model_name: String,
    pub model_version: String,
    pub schema: FormSchema,
}

/// Router exposing JSON and form-encoded prediction endpoints plus the form schema.
pub fn prediction_router<M>(service: Arc<PredictionService<M>>) -> Router
where
    M: LoanModel + 'static,
{
    Router::new()
        .route("/api/v1/predictions", post(predict_json_handler::<M>))
        .route("/api/v1/predictions/form", get(form_handler::<M>))
        .route("/predict", post(predict_form_handler::<M>))
        .with_state(service)
}

pub(crate) async fn predict_json_handler<M>(
    State(service): State<Arc<PredictionService<M>>>,
    Json(submission): Json<RawSubmission>,
) -> Response
where
    M: LoanModel + 'static,
{
    outcome_response(service.handle(submission))
}

pub(crate) async fn predict_form_handler<M>(
    State(service): State<Arc<PredictionService<M>>>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response
where
    M: LoanModel + 'static,
{
    outcome_response(service.handle(RawSubmission::from(fields)))
}

pub(crate) async fn form_handler<M>(
    State(service): State<Arc<PredictionService<M>>>,
) -> Json<FormView>
where
    M: LoanModel + 'static,
{
    let model = service.model();
    Json(FormView {
        model_name: model.name().to_string(),
        model_version: model.version().to_string(),
        schema: form_schema(),
    })
}

fn outcome_response(outcome: PredictionOutcome) -> Response {
    match outcome {
        PredictionOutcome::Predicted(result) => {
            (StatusCode::OK, Json(PredictionView::from(&result))).into_response()
        }
        PredictionOutcome::Rejected { report, submitted } => {
            let payload = json!({
                "error": report.message(),
                "violations": report.violations(),
                "submitted": submitted,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        PredictionOutcome::Failed { error, submitted } => {
            let payload = json!({
                "error": error.to_string(),
                "submitted": submitted,
            });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}
