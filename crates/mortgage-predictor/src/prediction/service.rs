use std::sync::Arc;

use tracing::{debug, error};

use super::domain::RawSubmission;
use super::model::LoanModel;
use super::orchestrator::{PredictionError, PredictionOrchestrator, PredictionResult};
use super::validation::{InputValidator, ValidationReport};

/// Renderable result of one request. Every path ends here; nothing escapes as a fault.
#[derive(Debug)]
pub enum PredictionOutcome {
    Predicted(PredictionResult),
    Rejected {
        report: ValidationReport,
        submitted: RawSubmission,
    },
    Failed {
        error: PredictionError,
        submitted: RawSubmission,
    },
}

impl PredictionOutcome {
    /// User-facing message for rejected or failed requests, or the note on a result.
    pub fn message(&self) -> Option<String> {
        match self {
            PredictionOutcome::Predicted(result) => result.note.map(str::to_string),
            PredictionOutcome::Rejected { report, .. } => Some(report.message()),
            PredictionOutcome::Failed { error, .. } => Some(error.to_string()),
        }
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            PredictionOutcome::Predicted(result) => Some(result),
            _ => None,
        }
    }
}

/// Validator and orchestrator composed behind a single injected model handle.
pub struct PredictionService<M: ?Sized> {
    validator: InputValidator,
    orchestrator: PredictionOrchestrator<M>,
}

impl<M> PredictionService<M>
where
    M: LoanModel + ?Sized,
{
    pub fn new(model: Arc<M>) -> Self {
        Self {
            validator: InputValidator::new(),
            orchestrator: PredictionOrchestrator::new(model),
        }
    }

    pub fn model(&self) -> &M {
        self.orchestrator.model()
    }

    pub fn handle(&self, submission: RawSubmission) -> PredictionOutcome {
        debug!(fields = submission.len(), "prediction request received");

        let record = match self.validator.validate(&submission) {
            Ok(record) => record,
            Err(report) => {
                error!(violations = report.len(), "{}", report.message());
                return PredictionOutcome::Rejected {
                    report,
                    submitted: submission,
                };
            }
        };
        debug!(?record, "form data validated");

        match self.orchestrator.predict(&record) {
            Ok(result) => PredictionOutcome::Predicted(result),
            Err(error) => PredictionOutcome::Failed {
                error,
                submitted: submission,
            },
        }
    }
}
