use serde::Serialize;

use super::domain::FeatureVector;

/// Joint classifier/regressor contract. Implementations are shared read-only across requests.
pub trait LoanModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError>;

    fn name(&self) -> &str;

    fn version(&self) -> &str;
}

/// Classification label, with a regression estimate only when one is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelOutput {
    ClassificationOnly { label: String },
    WithRegression { label: String, value: f64 },
}

impl ModelOutput {
    /// Adapts the `(label, regression collection)` pair many pipelines emit.
    /// An empty collection means the regressor was suppressed for this label.
    pub fn from_parts(label: impl Into<String>, regression: &[f64]) -> Self {
        let label = label.into();
        match regression.first() {
            Some(value) => Self::WithRegression {
                label,
                value: *value,
            },
            None => Self::ClassificationOnly { label },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ModelOutput::ClassificationOnly { label } | ModelOutput::WithRegression { label, .. } => {
                label
            }
        }
    }

    pub fn regression(&self) -> Option<f64> {
        match self {
            ModelOutput::ClassificationOnly { .. } => None,
            ModelOutput::WithRegression { value, .. } => Some(*value),
        }
    }
}

/// Inference-time failure raised by a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("column {column} expected a {expected} value")]
    ColumnType {
        column: &'static str,
        expected: &'static str,
    },
    #[error("{head} head produced a non-finite score")]
    NonFinite { head: &'static str },
    #[error("{0}")]
    Inference(String),
}
