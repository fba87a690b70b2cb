//! Error types for the violation list normalizer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizerError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to serialize problem document: {0}")]
    Serialization(#[from] serde_json::Error),
}
