//! Validation-to-reconciliation prediction pipeline.
//!
//! Raw field maps are validated into [`FeatureRecord`]s, passed through a [`LoanModel`],
//! and the classifier/regressor outputs are reconciled into a [`PredictionResult`].

pub mod artifact;
pub mod domain;
pub mod input;
pub mod model;
pub mod orchestrator;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use artifact::{ArtifactModel, ModelLoadError};
pub use domain::{
    Channel, FeatureCell, FeatureRecord, FeatureVector, FieldBounds, FieldKind,
    FirstTimeHomebuyer, LoanField, RawSubmission, RawValue,
};
pub use input::{
    submissions_from_csv, submissions_from_json, submissions_from_path, SubmissionInputError,
};
pub use model::{LoanModel, ModelError, ModelOutput};
pub use orchestrator::{
    reconcile, PredictionError, PredictionOrchestrator, PredictionResult, NO_PREPAYMENT_NOTE,
};
pub use router::{prediction_router, FormView, PredictionView};
pub use service::{PredictionOutcome, PredictionService};
pub use validation::{form_schema, FormSchema, InputValidator, ValidationReport};
