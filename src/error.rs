//! Error types for sleep-quality operations.
//!
//! Training errors are fatal and carry enough context (the dataset's actual
//! column list, the offending artifact path) for an operator to diagnose
//! them without rerunning. Inference never produces these for present
//! input; unknown categories and missing fields are handled as data, not
//! as errors.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sleep-quality operations.
///
/// # Examples
///
/// ```
/// use sleep_quality::error::SleepError;
///
/// let err = SleepError::missing_column("quality_of_sleep", &["age".to_string()]);
/// assert!(err.to_string().contains("quality_of_sleep"));
/// assert!(err.to_string().contains("age"));
/// ```
#[derive(Debug, Error)]
pub enum SleepError {
    /// A required column is absent from the training data.
    #[error("column '{column}' not found; available columns: {available:?}")]
    Schema {
        /// Required column name (after normalization)
        column: String,
        /// Columns actually present in the dataset
        available: Vec<String>,
    },

    /// Dataset or split is empty or degenerate.
    #[error("data error: {0}")]
    Data(String),

    /// Persisted metadata and pipeline disagree about the feature layout.
    #[error("schema mismatch between metadata and model: {field}: metadata={metadata}, model={model}")]
    SchemaMismatch {
        /// Which part of the layout disagrees
        field: String,
        /// What the metadata document declares
        metadata: String,
        /// What the pipeline object expects
        model: String,
    },

    /// Artifact is missing, truncated or corrupt.
    #[error("artifact {path}: {message}")]
    Artifact {
        /// Artifact location
        path: PathBuf,
        /// Failure description
        message: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    #[error("invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Estimator used before `fit`.
    #[error("{0} is not fitted")]
    NotFitted(&'static str),

    /// CSV parsing failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SleepError {
    fn from(err: serde_json::Error) -> Self {
        SleepError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for SleepError {
    fn from(err: bincode::Error) -> Self {
        SleepError::Serialization(err.to_string())
    }
}

impl SleepError {
    /// Create a schema error for an absent column, listing what is present.
    #[must_use]
    pub fn missing_column(column: &str, available: &[String]) -> Self {
        Self::Schema {
            column: column.to_string(),
            available: available.to_vec(),
        }
    }

    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an empty input error
    #[must_use]
    pub fn empty_input(context: &str) -> Self {
        Self::Data(format!("empty input: {context}"))
    }

    /// Create an artifact error for `path`.
    #[must_use]
    pub fn artifact(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Artifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a metadata/model layout mismatch error.
    #[must_use]
    pub fn schema_mismatch(
        field: &str,
        metadata: impl std::fmt::Debug,
        model: impl std::fmt::Debug,
    ) -> Self {
        Self::SchemaMismatch {
            field: field.to_string(),
            metadata: format!("{metadata:?}"),
            model: format!("{model:?}"),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, SleepError>;
