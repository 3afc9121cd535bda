//! Error types for the sleep-quality CLI.

use sleep_quality::SleepError;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// Training data file does not exist
    #[error("Dataset not found: {0}")]
    DatasetNotFound(PathBuf),

    /// Prediction input could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Library error
    #[error("{0}")]
    Sleep(#[from] SleepError),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::DatasetNotFound(_) => ExitCode::from(3),
            Self::InvalidInput(_) => ExitCode::from(5),
            Self::Io(_) => ExitCode::from(7),
            Self::Sleep(e) => match e {
                SleepError::Schema { .. } => ExitCode::from(2),
                SleepError::Data(_) => ExitCode::from(4),
                SleepError::Artifact { .. } | SleepError::SchemaMismatch { .. } => {
                    ExitCode::from(6)
                }
                SleepError::Io(_) | SleepError::Csv(_) => ExitCode::from(7),
                _ => ExitCode::from(1),
            },
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidInput(e.to_string())
    }
}
