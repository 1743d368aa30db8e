//! JSON-serialized linear model with a classification head and a regression head.
//!
//! The artifact fixes its own input encoding: numeric columns are centered and scaled,
//! categorical columns are one-hot encoded over the levels the artifact lists (unknown
//! levels encode as all zeros). Labels listed in `terminal_labels` suppress the
//! regression head entirely.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::domain::{FeatureCell, FeatureVector, FieldKind, LoanField};
use super::model::{LoanModel, ModelError, ModelOutput};

/// Failure to load an artifact. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("model artifact is inconsistent: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct ArtifactDocument {
    name: String,
    version: String,
    columns: Vec<String>,
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    scaling: BTreeMap<String, ColumnScaling>,
    classifier: ClassifierHead,
    regressor: RegressorHead,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ColumnScaling {
    #[serde(default)]
    center: f64,
    #[serde(default = "unit_scale")]
    scale: f64,
}

fn unit_scale() -> f64 {
    1.0
}

impl Default for ColumnScaling {
    fn default() -> Self {
        Self {
            center: 0.0,
            scale: unit_scale(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassifierHead {
    labels: Vec<String>,
    intercepts: Vec<f64>,
    weights: Vec<Vec<f64>>,
    #[serde(default)]
    terminal_labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegressorHead {
    intercept: f64,
    weights: Vec<f64>,
}

#[derive(Debug)]
enum ColumnEncoder {
    Numeric { center: f64, scale: f64 },
    OneHot { levels: Vec<String> },
}

impl ColumnEncoder {
    fn width(&self) -> usize {
        match self {
            ColumnEncoder::Numeric { .. } => 1,
            ColumnEncoder::OneHot { levels } => levels.len(),
        }
    }
}

/// Model loaded once from a JSON artifact and shared read-only afterwards.
#[derive(Debug)]
pub struct ArtifactModel {
    name: String,
    version: String,
    encoders: Vec<(LoanField, ColumnEncoder)>,
    labels: Vec<String>,
    intercepts: Vec<f64>,
    class_weights: Vec<Vec<f64>>,
    terminal_labels: BTreeSet<String>,
    regression_intercept: f64,
    regression_weights: Vec<f64>,
}

impl ArtifactModel {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "start loading the model");
        let file = std::fs::File::open(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::from_reader(std::io::BufReader::new(file))?;
        info!(name = %model.name, version = %model.version, "model loaded");
        Ok(model)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        let document: ArtifactDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    fn from_document(document: ArtifactDocument) -> Result<Self, ModelLoadError> {
        let ArtifactDocument {
            name,
            version,
            columns,
            mut categories,
            scaling,
            classifier,
            regressor,
        } = document;

        let expected: Vec<&str> = LoanField::COLUMN_ORDER
            .iter()
            .map(|field| field.name())
            .collect();
        if columns != expected {
            return Err(ModelLoadError::Invalid(format!(
                "columns must be {expected:?}, found {columns:?}"
            )));
        }

        let mut encoders = Vec::with_capacity(LoanField::COLUMN_ORDER.len());
        for field in LoanField::COLUMN_ORDER {
            let encoder = match field.kind() {
                FieldKind::Categorical => {
                    let levels = categories.remove(field.name()).ok_or_else(|| {
                        ModelLoadError::Invalid(format!("no categories listed for {field}"))
                    })?;
                    if levels.is_empty() {
                        return Err(ModelLoadError::Invalid(format!(
                            "categories for {field} are empty"
                        )));
                    }
                    ColumnEncoder::OneHot { levels }
                }
                FieldKind::Integer | FieldKind::Real => {
                    let ColumnScaling { center, scale } =
                        scaling.get(field.name()).copied().unwrap_or_default();
                    if !center.is_finite() || !scale.is_finite() || scale == 0.0 {
                        return Err(ModelLoadError::Invalid(format!(
                            "scaling for {field} must be finite with a non-zero scale"
                        )));
                    }
                    ColumnEncoder::Numeric { center, scale }
                }
            };
            encoders.push((field, encoder));
        }
        if let Some(unknown) = categories.keys().next() {
            return Err(ModelLoadError::Invalid(format!(
                "categories listed for non-categorical column {unknown}"
            )));
        }

        let width: usize = encoders.iter().map(|(_, encoder)| encoder.width()).sum();

        let ClassifierHead {
            labels,
            intercepts,
            weights: class_weights,
            terminal_labels,
        } = classifier;
        if labels.is_empty() {
            return Err(ModelLoadError::Invalid(
                "classifier must declare at least one label".to_string(),
            ));
        }
        if intercepts.len() != labels.len() || class_weights.len() != labels.len() {
            return Err(ModelLoadError::Invalid(format!(
                "classifier declares {} labels but {} intercepts and {} weight rows",
                labels.len(),
                intercepts.len(),
                class_weights.len()
            )));
        }
        if let Some(row) = class_weights.iter().position(|row| row.len() != width) {
            return Err(ModelLoadError::Invalid(format!(
                "classifier weight row {row} must have {width} entries"
            )));
        }
        if regressor.weights.len() != width {
            return Err(ModelLoadError::Invalid(format!(
                "regressor must have {width} weights, found {}",
                regressor.weights.len()
            )));
        }

        let terminal_labels: BTreeSet<String> = terminal_labels.into_iter().collect();
        if let Some(unknown) = terminal_labels.iter().find(|label| !labels.contains(*label)) {
            return Err(ModelLoadError::Invalid(format!(
                "terminal label {unknown} is not a classifier label"
            )));
        }

        Ok(Self {
            name,
            version,
            encoders,
            labels,
            intercepts,
            class_weights,
            terminal_labels,
            regression_intercept: regressor.intercept,
            regression_weights: regressor.weights,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn encode(&self, features: &FeatureVector) -> Result<Vec<f64>, ModelError> {
        let mut encoded = Vec::with_capacity(self.regression_weights.len());
        for ((field, encoder), (_, cell)) in self.encoders.iter().zip(features.columns()) {
            match (encoder, cell) {
                (ColumnEncoder::Numeric { center, scale }, FeatureCell::Numeric(value)) => {
                    encoded.push((value - center) / scale);
                }
                (ColumnEncoder::OneHot { levels }, FeatureCell::Categorical(value)) => {
                    encoded.extend(
                        levels
                            .iter()
                            .map(|level| if level == value { 1.0 } else { 0.0 }),
                    );
                }
                (ColumnEncoder::Numeric { .. }, FeatureCell::Categorical(_)) => {
                    return Err(ModelError::ColumnType {
                        column: field.name(),
                        expected: "numeric",
                    });
                }
                (ColumnEncoder::OneHot { .. }, FeatureCell::Numeric(_)) => {
                    return Err(ModelError::ColumnType {
                        column: field.name(),
                        expected: "categorical",
                    });
                }
            }
        }
        Ok(encoded)
    }

    /// Raw pipeline output: the label plus a regression collection that is empty
    /// for terminal labels.
    fn predict_parts(&self, features: &FeatureVector) -> Result<(&str, Vec<f64>), ModelError> {
        let encoded = self.encode(features)?;

        let mut best: Option<(usize, f64)> = None;
        for (idx, (intercept, weights)) in self
            .intercepts
            .iter()
            .zip(&self.class_weights)
            .enumerate()
        {
            let score = intercept + dot(weights, &encoded);
            if !score.is_finite() {
                return Err(ModelError::NonFinite { head: "classifier" });
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((idx, score));
            }
        }
        let (label_idx, _) = best.ok_or_else(|| ModelError::Inference("no labels".to_string()))?;
        let label = self.labels[label_idx].as_str();

        if self.terminal_labels.contains(label) {
            return Ok((label, Vec::new()));
        }

        let value = self.regression_intercept + dot(&self.regression_weights, &encoded);
        if !value.is_finite() {
            return Err(ModelError::NonFinite { head: "regressor" });
        }
        Ok((label, vec![value]))
    }
}

fn dot(weights: &[f64], encoded: &[f64]) -> f64 {
    weights.iter().zip(encoded).map(|(w, x)| w * x).sum()
}

impl LoanModel for ArtifactModel {
    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, ModelError> {
        let (label, regression) = self.predict_parts(features)?;
        Ok(ModelOutput::from_parts(label, &regression))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }
}
