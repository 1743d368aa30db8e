use crate::config::ConfigError;
use crate::prediction::{ModelLoadError, SubmissionInputError};
use crate::telemetry::TelemetryError;
use std::fmt;

/// Failures that stop the process: startup, configuration, or CLI input problems.
///
/// Per-request failures never surface here; they are rendered by the prediction service.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Model(ModelLoadError),
    Input(SubmissionInputError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Model(err) => write!(f, "model error: {}", err),
            AppError::Input(err) => write!(f, "input error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Model(err) => Some(err),
            AppError::Input(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ModelLoadError> for AppError {
    fn from(value: ModelLoadError) -> Self {
        Self::Model(value)
    }
}

impl From<SubmissionInputError> for AppError {
    fn from(value: SubmissionInputError) -> Self {
        Self::Input(value)
    }
}
