//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] huesort_models::ConfigError),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Batch task failed: {0}")]
    BatchFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn batch_failed(msg: impl Into<String>) -> Self {
        Self::BatchFailed(msg.into())
    }

    /// Whether the error comes from bad settings rather than the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WorkerError::ConfigError(_) | WorkerError::InvalidConfiguration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(WorkerError::config_error("missing dest").is_configuration());
        let parse = huesort_models::Configuration::from_json("{").unwrap_err();
        assert!(WorkerError::from(parse).is_configuration());
        assert!(!WorkerError::batch_failed("panicked").is_configuration());
    }
}
