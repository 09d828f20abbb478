//! Error handling for the irrigation decision engine
//!
//! Every failure maps onto a serializable [`ErrorResponse`] so callers at the
//! outer boundary can report it without knowing the variant.

use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input validation errors
    #[error("Band shape mismatch: red {red:?} vs nir {nir:?}")]
    ShapeMismatch {
        red: (usize, usize),
        nir: (usize, usize),
    },

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Unknown crop type: {0}")]
    UnknownCrop(String),

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Unavailable dependencies
    #[error("Stress forecast model is not trained yet")]
    ModelUnavailable,

    #[error("Model training failed: {0}")]
    Training(String),

    #[error("Model artifact error: {0}")]
    ModelArtifact(#[from] std::io::Error),

    #[error("Invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a field-level validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            AppError::InvalidGrid(_) => "INVALID_GRID",
            AppError::UnknownCrop(_) => "UNKNOWN_CROP",
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::ModelUnavailable => "MODEL_UNAVAILABLE",
            AppError::Training(_) => "TRAINING_FAILED",
            AppError::ModelArtifact(_) => "MODEL_ARTIFACT_ERROR",
            AppError::InvalidArtifact(_) => "INVALID_MODEL_ARTIFACT",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::ShapeMismatch { .. }
            | AppError::InvalidGrid(_)
            | AppError::UnknownCrop(_)
            | AppError::Validation { .. } => ErrorCategory::InputValidation,
            AppError::ModelUnavailable
            | AppError::Training(_)
            | AppError::ModelArtifact(_)
            | AppError::InvalidArtifact(_) => ErrorCategory::UnavailableDependency,
            AppError::Serialization(_)
            | AppError::Configuration(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Convert into the response body and log the failure
    pub fn to_response(&self) -> ErrorResponse {
        let error_detail = match self {
            AppError::ShapeMismatch { .. } => ErrorDetail::new(
                self,
                "Red and NIR bands must have identical dimensions".to_string(),
                Some("source".to_string()),
            ),
            AppError::InvalidGrid(msg) => {
                ErrorDetail::new(self, msg.clone(), Some("source".to_string()))
            }
            AppError::UnknownCrop(crop) => ErrorDetail::new(
                self,
                format!(
                    "Unknown crop type '{}'. Available: {}",
                    crop,
                    shared::crop_ids().join(", ")
                ),
                Some("crop_type".to_string()),
            ),
            AppError::Validation { field, message } => {
                ErrorDetail::new(self, message.clone(), Some(field.clone()))
            }
            AppError::ModelUnavailable => ErrorDetail::new(
                self,
                "Stress forecast model is still training".to_string(),
                None,
            ),
            AppError::Training(msg) => {
                ErrorDetail::new(self, format!("Model training failed: {}", msg), None)
            }
            AppError::ModelArtifact(_) => ErrorDetail::new(
                self,
                "Model artifact could not be read or written".to_string(),
                None,
            ),
            AppError::InvalidArtifact(msg) => {
                ErrorDetail::new(self, format!("Model artifact is malformed: {}", msg), None)
            }
            AppError::Serialization(_) => {
                ErrorDetail::new(self, "Malformed JSON document".to_string(), None)
            }
            AppError::Configuration(msg) => {
                ErrorDetail::new(self, format!("Configuration error: {}", msg), None)
            }
            AppError::Internal(msg) => ErrorDetail::new(self, msg.clone(), None),
            AppError::InternalError(_) => {
                ErrorDetail::new(self, "An internal error occurred".to_string(), None)
            }
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        ErrorResponse {
            error: error_detail,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .errors()
            .keys()
            .min()
            .map(|f| f.to_string())
            .unwrap_or_default();
        AppError::Validation {
            field,
            message: errors.to_string(),
        }
    }
}

/// Broad classes of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InputValidation,
    UnavailableDependency,
    Internal,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(error: &AppError, message: String, field: Option<String>) -> Self {
        Self {
            code: error.code().to_string(),
            category: error.category(),
            message,
            field,
        }
    }
}

/// Result type alias for engine operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_crop_response_lists_known_crops() {
        let response = AppError::UnknownCrop("quinoa".into()).to_response();
        assert_eq!(response.error.code, "UNKNOWN_CROP");
        assert_eq!(response.error.category, ErrorCategory::InputValidation);
        assert!(response.error.message.contains("wheat"));
        assert_eq!(response.error.field.as_deref(), Some("crop_type"));
    }

    #[test]
    fn configuration_failures_have_a_response() {
        let err = AppError::from(config::ConfigError::Message("bad value for forecast.n_trees".into()));
        let response = err.to_response();
        assert_eq!(response.error.code, "CONFIGURATION_ERROR");
        assert_eq!(response.error.category, ErrorCategory::Internal);
        assert!(response.error.message.contains("forecast.n_trees"));
    }

    #[test]
    fn invalid_artifact_is_a_dependency_error() {
        let err = AppError::InvalidArtifact("tree 0: tree has no nodes".into());
        assert_eq!(err.category(), ErrorCategory::UnavailableDependency);
        assert_eq!(err.to_response().error.code, "INVALID_MODEL_ARTIFACT");
    }

    #[test]
    fn model_unavailable_is_a_dependency_error() {
        let err = AppError::ModelUnavailable;
        assert_eq!(err.category(), ErrorCategory::UnavailableDependency);
        assert_eq!(err.to_response().error.code, "MODEL_UNAVAILABLE");
    }
}
