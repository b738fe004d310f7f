//! Error types for Bloodline Core

use thiserror::Error;

use crate::limits::ValidationError;

/// Result type alias using Bloodline's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Bloodline error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Animal not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came from the data provider rather than the caller's input
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::DataUnavailable(_))
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
