use crate::infra::load_model;
use clap::Args;
use mortgage_predictor::config::AppConfig;
use mortgage_predictor::error::AppError;
use mortgage_predictor::prediction::{
    submissions_from_path, LoanModel, PredictionOutcome, PredictionService, PredictionView,
};
use mortgage_predictor::telemetry;
use serde_json::json;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// JSON object/array or CSV file of submissions (CSV header names the fields)
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the configured model artifact path
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Print outcomes as a JSON array instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let PredictArgs { input, model, json } = args;

    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;

    let model = load_model(&config.model, model)?;
    let submissions = submissions_from_path(&input)?;
    let service = PredictionService::new(model);

    let outcomes: Vec<PredictionOutcome> = submissions
        .into_iter()
        .map(|submission| service.handle(submission))
        .collect();

    if json {
        let rendered: Vec<serde_json::Value> = outcomes.iter().map(outcome_json).collect();
        match serde_json::to_string_pretty(&rendered) {
            Ok(text) => println!("{text}"),
            Err(err) => println!("Outcome payload unavailable: {err}"),
        }
    } else {
        render_outcomes(&service, &outcomes);
    }

    Ok(())
}

fn outcome_json(outcome: &PredictionOutcome) -> serde_json::Value {
    match outcome {
        PredictionOutcome::Predicted(result) => json!({
            "status": "predicted",
            "prediction": PredictionView::from(result),
        }),
        PredictionOutcome::Rejected { report, submitted } => json!({
            "status": "rejected",
            "error": report.message(),
            "submitted": submitted,
        }),
        PredictionOutcome::Failed { error, submitted } => json!({
            "status": "failed",
            "error": error.to_string(),
            "submitted": submitted,
        }),
    }
}

fn render_outcomes<M: LoanModel>(service: &PredictionService<M>, outcomes: &[PredictionOutcome]) {
    println!(
        "Model {} ({}) scored {} submission(s)",
        service.model().name(),
        service.model().version(),
        outcomes.len()
    );

    for (idx, outcome) in outcomes.iter().enumerate() {
        let number = idx + 1;
        match outcome {
            PredictionOutcome::Predicted(result) => {
                let estimate = match result.regression {
                    Some(value) => format!("prepayment estimate {value:.4}"),
                    None => result.note.unwrap_or_default().to_string(),
                };
                println!(
                    "- #{number}: {} | {} | {:.2}s",
                    result.classification,
                    estimate,
                    result.elapsed_seconds()
                );
            }
            PredictionOutcome::Rejected { report, .. } => {
                println!("- #{number}: rejected");
                for violation in report.violations() {
                    println!("    {violation}");
                }
            }
            PredictionOutcome::Failed { error, .. } => {
                println!("- #{number}: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortgage_predictor::prediction::{ArtifactModel, RawSubmission};
    use std::sync::Arc;

    #[test]
    fn outcome_json_tags_each_path() {
        let path =
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../model/mortgage_pipeline.json");
        let model = ArtifactModel::from_path(path).expect("bundled artifact loads");
        let service = PredictionService::new(Arc::new(model));

        let rejected = service.handle(RawSubmission::new());
        let rendered = outcome_json(&rejected);
        assert_eq!(rendered["status"], json!("rejected"));
        assert!(rendered["error"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Attention: Please provide MonthsDelinquent."));
    }
}
