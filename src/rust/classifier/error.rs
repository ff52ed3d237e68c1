use std::fmt;

use super::embedding::EmbeddingError;
use crate::centroid_cache::CacheError;

/// Represents the different types of errors that can occur while classifying questions.
#[derive(Debug)]
pub enum ClassifierError {
    /// The embedding service failed (network, auth, quota or malformed reply)
    ServiceError(EmbeddingError),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred due to invalid registry or builder parameters
    ValidationError(String),
    /// Offline centroid precomputation failed
    PrecomputeError(String),
    /// The centroid file could not be written or parsed
    CacheError(CacheError),
    /// The question was missing or empty
    InvalidQuestion(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceError(err) => write!(f, "Embedding service error: {}", err),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::PrecomputeError(msg) => write!(f, "Precompute error: {}", msg),
            Self::CacheError(err) => write!(f, "Centroid cache error: {}", err),
            Self::InvalidQuestion(msg) => write!(f, "Invalid question: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ServiceError(err) => Some(err),
            Self::CacheError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EmbeddingError> for ClassifierError {
    fn from(err: EmbeddingError) -> Self {
        ClassifierError::ServiceError(err)
    }
}

impl From<CacheError> for ClassifierError {
    fn from(err: CacheError) -> Self {
        ClassifierError::CacheError(err)
    }
}
